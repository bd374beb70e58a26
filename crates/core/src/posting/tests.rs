//! Tests for the preview/confirm protocol.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use rstest::rstest;
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use tallybook_shared::AppError;

use super::error::{GatewayError, IntegrityFailure, PostingError};
use super::gateway::PostingGateway;
use super::protocol::PostingProtocol;
use super::types::{
    ConfirmRequest, Draft, LegacyPostRequest, PostResult, PostingPhase, PreviewRequest, RowPatch,
};
use crate::thread::{SaveStatus, Session, SessionStatus};

/// In-memory stand-in for the orchestrator's preview/confirm endpoints.
#[derive(Default)]
struct FakeServer {
    state: Mutex<ServerState>,
}

#[derive(Default)]
struct ServerState {
    issued: HashMap<String, String>,
    consumed: HashSet<String>,
    next_preview: u32,
    next_entry: u32,
    preview_failure: Option<GatewayError>,
    confirm_failure: Option<GatewayError>,
    legacy_failure: Option<GatewayError>,
    confirm_body: Option<Value>,
    preview_body: Option<Value>,
    previews: Vec<PreviewRequest>,
    confirms: Vec<ConfirmRequest>,
    legacy: Vec<LegacyPostRequest>,
}

impl FakeServer {
    fn with(configure: impl FnOnce(&mut ServerState)) -> Self {
        let server = Self::default();
        configure(&mut server.state.lock().unwrap());
        server
    }

    fn respond_to_preview(&self, request: &PreviewRequest) -> Result<Value, GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.previews.push(request.clone());
        if let Some(err) = state.preview_failure.take() {
            return Err(err);
        }
        if let Some(body) = state.preview_body.take() {
            return Ok(body);
        }
        state.next_preview += 1;
        let preview_id = format!("pv-{}", state.next_preview);
        let hash = format!("hash-{}", state.next_preview);
        state.issued.insert(preview_id.clone(), hash.clone());
        Ok(json!({
            "status": "preview",
            "journal": [
                { "debitAccount": "Rent", "creditAccount": "Cash", "amount": "400" },
                { "debitAccount": "Cash", "creditAccount": "Sales", "amount": "1000" }
            ],
            "previewId": preview_id,
            "hash": hash
        }))
    }

    fn confirms(&self) -> usize {
        self.state.lock().unwrap().confirms.len()
    }

    fn last_preview(&self) -> PreviewRequest {
        self.state.lock().unwrap().previews.last().cloned().unwrap()
    }
}

impl PostingGateway for FakeServer {
    async fn preview(&self, request: &PreviewRequest) -> Result<Value, GatewayError> {
        self.respond_to_preview(request)
    }

    async fn confirm(&self, request: &ConfirmRequest) -> Result<Value, GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.confirms.push(request.clone());
        if let Some(err) = state.confirm_failure.take() {
            return Err(err);
        }
        if let Some(body) = state.confirm_body.take() {
            return Ok(body);
        }
        let valid = state.issued.get(&request.preview_id) == Some(&request.hash)
            && !state.consumed.contains(&request.preview_id);
        if !valid {
            return Ok(json!({ "success": false, "code": "hash_mismatch", "message": "Hash mismatch" }));
        }
        state.consumed.insert(request.preview_id.clone());
        state.next_entry += 1;
        Ok(json!({ "success": true, "entryIds": [state.next_entry], "message": "Posted" }))
    }

    async fn confirm_legacy(&self, request: &LegacyPostRequest) -> Result<Value, GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.legacy.push(request.clone());
        if let Some(err) = state.legacy_failure.take() {
            return Err(err);
        }
        Ok(json!({ "status": "posted", "ids": ["L-1", "L-2"] }))
    }
}

fn preview_body(preview_id: &str, hash: &str) -> Value {
    json!({
        "status": "preview",
        "journal": [{ "debitAccount": "Rent", "creditAccount": "Cash", "amount": 400 }],
        "previewId": preview_id,
        "hash": hash
    })
}

fn rent() -> Draft {
    Draft::prompt("Paid rent 400 from cash").unwrap()
}

fn active_pair(session: &Session) -> (String, String) {
    let active = session.active_preview().unwrap();
    (active.preview_id.clone(), active.hash.clone())
}

#[tokio::test]
async fn test_preview_then_confirm_succeeds() {
    let server = FakeServer::default();
    let protocol = PostingProtocol::default();
    let mut session = Session::start();

    let index = protocol.preview(&server, &mut session, rent()).await.unwrap();
    assert_eq!(session.status(), SessionStatus::Preview);
    assert_eq!(session.phase(), PostingPhase::Previewed);

    let (preview_id, hash) = active_pair(&session);
    let status = protocol
        .confirm(&server, &mut session, &preview_id, &hash)
        .await
        .unwrap();

    assert_eq!(
        status,
        SaveStatus::Saved {
            message: Some("Posted".to_string()),
            posted_ids: vec!["1".to_string()],
        }
    );
    assert_eq!(session.save_status(index), Some(&status));
    assert_eq!(session.status(), SessionStatus::Idle);
    assert_eq!(session.phase(), PostingPhase::Confirmed);
    assert!(session.active_preview().is_none());
    assert_eq!(session.last_prompt(), Some("Paid rent 400 from cash"));

    let sent = server.last_preview();
    assert_eq!(sent.session_id, session.id());
    assert!(sent.idempotency_key.as_str().starts_with("paid-rent-400-from-cash-"));
}

#[tokio::test]
async fn test_mutated_hash_is_refused_before_sending() {
    let server = FakeServer::default();
    let protocol = PostingProtocol::default();
    let mut session = Session::start();

    protocol.preview(&server, &mut session, rent()).await.unwrap();
    let (preview_id, _) = active_pair(&session);

    let err = protocol
        .confirm(&server, &mut session, &preview_id, "tampered")
        .await
        .unwrap_err();

    assert_eq!(
        err,
        PostingError::Integrity(IntegrityFailure::Mismatch { preview_id })
    );
    assert!(err.requires_new_preview());
    assert_eq!(server.confirms(), 0);
    // The genuine preview is still confirmable.
    assert!(session.active_preview().is_some());
}

#[tokio::test]
async fn test_confirming_twice_is_refused() {
    let server = FakeServer::default();
    let protocol = PostingProtocol::default();
    let mut session = Session::start();

    let index = protocol.preview(&server, &mut session, rent()).await.unwrap();
    let (preview_id, hash) = active_pair(&session);
    protocol
        .confirm(&server, &mut session, &preview_id, &hash)
        .await
        .unwrap();

    let err = protocol
        .confirm(&server, &mut session, &preview_id, &hash)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PostingError::Integrity(IntegrityFailure::Consumed { .. })
    ));
    assert_eq!(server.confirms(), 1);
    assert!(session.save_status(index).unwrap().is_saved());
}

#[tokio::test]
async fn test_server_hash_rejection_is_an_integrity_error() {
    let server = FakeServer::with(|state| {
        state.confirm_body = Some(json!({
            "status": "error",
            "code": "STALE_PREVIEW",
            "message": "Draft changed since preview"
        }));
    });
    let protocol = PostingProtocol::default();
    let mut session = Session::start();

    let index = protocol.preview(&server, &mut session, rent()).await.unwrap();
    let (preview_id, hash) = active_pair(&session);
    let err = protocol
        .confirm(&server, &mut session, &preview_id, &hash)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        PostingError::Integrity(IntegrityFailure::Rejected(
            "Draft changed since preview".to_string()
        ))
    );
    assert_eq!(
        session.save_status(index),
        Some(&SaveStatus::IntegrityFailed {
            message: "Draft changed since preview".to_string()
        })
    );
    assert_eq!(session.status(), SessionStatus::Error);
    assert!(session.active_preview().is_none());

    let retry = protocol
        .confirm(&server, &mut session, &preview_id, &hash)
        .await
        .unwrap_err();
    assert!(matches!(
        retry,
        PostingError::Integrity(IntegrityFailure::Superseded { .. })
    ));
}

#[tokio::test]
async fn test_transport_conflict_is_an_integrity_error() {
    let server = FakeServer::with(|state| {
        state.confirm_failure = Some(GatewayError::Conflict("409".to_string()));
    });
    let protocol = PostingProtocol::default();
    let mut session = Session::start();

    protocol.preview(&server, &mut session, rent()).await.unwrap();
    let err = protocol
        .confirm_active(&server, &mut session)
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), "INTEGRITY_ERROR");
    assert_eq!(session.phase(), PostingPhase::Failed);
}

#[tokio::test]
async fn test_business_rejection_is_recorded_not_raised() {
    let server = FakeServer::with(|state| {
        state.confirm_body = Some(json!({ "success": false, "message": "Period is closed" }));
    });
    let protocol = PostingProtocol::default();
    let mut session = Session::start();

    let index = protocol.preview(&server, &mut session, rent()).await.unwrap();
    let status = protocol.confirm_active(&server, &mut session).await.unwrap();

    let expected = SaveStatus::Rejected {
        message: "Period is closed".to_string(),
    };
    assert_eq!(status, expected);
    assert_eq!(session.save_status(index), Some(&expected));
}

#[tokio::test]
async fn test_network_failure_keeps_preview_confirmable() {
    let server = FakeServer::with(|state| {
        state.confirm_failure = Some(GatewayError::Timeout);
    });
    let protocol = PostingProtocol::default();
    let mut session = Session::start();

    let index = protocol.preview(&server, &mut session, rent()).await.unwrap();
    let err = protocol.confirm_active(&server, &mut session).await.unwrap_err();

    assert!(err.is_retryable());
    assert_eq!(session.save_status(index), None);

    let status = protocol.confirm_active(&server, &mut session).await.unwrap();
    assert!(status.is_saved());
}

#[tokio::test]
async fn test_preview_network_failure_appends_nothing() {
    let server = FakeServer::with(|state| {
        state.preview_failure = Some(GatewayError::Transport("connection reset".to_string()));
    });
    let protocol = PostingProtocol::default();
    let mut session = Session::start();

    let err = protocol
        .preview(&server, &mut session, rent())
        .await
        .unwrap_err();

    assert_eq!(err, PostingError::Network("connection reset".to_string()));
    assert!(session.timeline().is_empty());
    assert_eq!(session.phase(), PostingPhase::Failed);
}

#[tokio::test]
async fn test_confirm_without_preview_is_refused() {
    let server = FakeServer::default();
    let protocol = PostingProtocol::default();
    let mut session = Session::start();

    let err = protocol.confirm_active(&server, &mut session).await.unwrap_err();
    assert_eq!(err, PostingError::Integrity(IntegrityFailure::NoActivePreview));
}

#[tokio::test]
async fn test_followup_then_redraft() {
    let server = FakeServer::with(|state| {
        state.preview_body = Some(json!({
            "status": "followup_needed",
            "clarification": "Which account paid?"
        }));
    });
    let protocol = PostingProtocol::default();
    let mut session = Session::start();

    protocol
        .preview(&server, &mut session, Draft::prompt("Paid rent").unwrap())
        .await
        .unwrap();
    assert_eq!(session.status(), SessionStatus::Followup);
    assert_eq!(session.phase(), PostingPhase::FollowupNeeded);

    protocol.preview(&server, &mut session, rent()).await.unwrap();
    assert_eq!(session.phase(), PostingPhase::Previewed);
    assert_eq!(session.timeline().len(), 2);
}

#[test]
fn test_out_of_order_previews_keep_newest_active() {
    let protocol = PostingProtocol::default();
    let mut session = Session::start();

    let first = protocol.begin_preview(&mut session, rent()).unwrap();
    let second = protocol
        .begin_preview(&mut session, Draft::prompt("Sold goods for 1000").unwrap())
        .unwrap();
    assert!(second.issue_seq() > first.issue_seq());

    let newer = protocol
        .complete_preview(&mut session, second, Ok(preview_body("pv-b", "hash-b")))
        .unwrap();
    let older = protocol
        .complete_preview(&mut session, first, Ok(preview_body("pv-a", "hash-a")))
        .unwrap();

    assert_eq!((newer, older), (0, 1));
    assert_eq!(session.timeline().len(), 2);
    assert_eq!(active_pair(&session), ("pv-b".to_string(), "hash-b".to_string()));
    assert!(matches!(
        session.previews_mut().check("pv-a", "hash-a"),
        Err(IntegrityFailure::Superseded { .. })
    ));
}

#[test]
fn test_in_order_previews_supersede_older() {
    let protocol = PostingProtocol::default();
    let mut session = Session::start();

    let first = protocol.begin_preview(&mut session, rent()).unwrap();
    let second = protocol.begin_preview(&mut session, rent()).unwrap();
    protocol
        .complete_preview(&mut session, first, Ok(preview_body("pv-a", "hash-a")))
        .unwrap();
    protocol
        .complete_preview(&mut session, second, Ok(preview_body("pv-b", "hash-b")))
        .unwrap();

    assert_eq!(active_pair(&session), ("pv-b".to_string(), "hash-b".to_string()));
    assert!(session.previews_mut().check("pv-a", "hash-a").is_err());
}

#[tokio::test]
async fn test_patch_supersedes_active_preview_immediately() {
    let server = FakeServer::default();
    let protocol = PostingProtocol::default();
    let mut session = Session::start();

    protocol.preview(&server, &mut session, rent()).await.unwrap();
    let (old_id, old_hash) = active_pair(&session);

    let pending = protocol
        .begin_patch(
            &mut session,
            vec![RowPatch::row(0).amount(dec!(450)).narration("Corrected rent")],
        )
        .unwrap();
    assert!(session.active_preview().is_none());

    let body = serde_json::to_value(pending.request()).unwrap();
    assert_eq!(body["basePreviewId"], json!(old_id));
    assert_eq!(body["patch"][0]["row"], json!(0));
    assert_eq!(body["patch"][0]["narration"], json!("Corrected rent"));
    assert!(body["patch"][0].get("debitAccount").is_none());

    let response = server.respond_to_preview(pending.request());
    protocol
        .complete_preview(&mut session, pending, response)
        .unwrap();

    let (new_id, _) = active_pair(&session);
    assert_ne!(new_id, old_id);

    let err = protocol
        .confirm(&server, &mut session, &old_id, &old_hash)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PostingError::Integrity(IntegrityFailure::Superseded { .. })
    ));
}

#[tokio::test]
async fn test_late_preview_cannot_revive_after_patch() {
    let server = FakeServer::default();
    let protocol = PostingProtocol::default();
    let mut session = Session::start();

    protocol.preview(&server, &mut session, rent()).await.unwrap();
    let straggler = protocol.begin_preview(&mut session, rent()).unwrap();
    let patch = protocol
        .begin_patch(&mut session, vec![RowPatch::row(1).debit_account("Bank")])
        .unwrap();

    protocol
        .complete_preview(&mut session, patch, Ok(preview_body("pv-patched", "hash-p")))
        .unwrap();
    protocol
        .complete_preview(&mut session, straggler, Ok(preview_body("pv-late", "hash-l")))
        .unwrap();

    assert_eq!(session.timeline().len(), 3);
    assert_eq!(session.active_preview().unwrap().preview_id, "pv-patched");
}

#[tokio::test]
async fn test_patch_validation() {
    let server = FakeServer::default();
    let protocol = PostingProtocol::default();
    let mut session = Session::start();

    let no_preview = protocol.begin_patch(&mut session, vec![RowPatch::row(0).date("2024-05-01")]);
    assert!(matches!(no_preview, Err(PostingError::Validation(_))));

    protocol.preview(&server, &mut session, rent()).await.unwrap();

    for patch in [
        vec![],
        vec![RowPatch::row(2).amount(dec!(10))],
        vec![RowPatch::row(0)],
        vec![RowPatch::row(0).amount(dec!(-5))],
    ] {
        let result = protocol.begin_patch(&mut session, patch);
        assert!(matches!(result, Err(PostingError::Validation(_))));
    }
    // Rejected patches leave the preview in place.
    assert!(session.active_preview().is_some());
}

#[test]
fn test_structured_draft_request() {
    let protocol = PostingProtocol::default();
    let mut session = Session::start();
    let draft = Draft::structured_json(Some("receipt"), r#"{"vendor":"ACME","total":"12.50"}"#)
        .unwrap();

    let pending = protocol.begin_preview(&mut session, draft).unwrap();
    let body = serde_json::to_value(pending.request()).unwrap();

    assert_eq!(body["docType"], json!("receipt"));
    assert_eq!(body["source"], json!("extraction"));
    assert_eq!(body["fields"]["vendor"], json!("ACME"));
    assert!(body.get("prompt").is_none());
    assert!(
        pending
            .request()
            .idempotency_key
            .as_str()
            .starts_with("doc-")
    );
    assert_eq!(session.last_prompt(), None);
}

#[rstest]
#[case(Draft::prompt("   "))]
#[case(Draft::structured_json(None, "{not json"))]
#[case(Draft::structured_json(Some("receipt"), "[1, 2]"))]
#[case(Draft::structured(None, json!("flat string")))]
fn test_invalid_drafts(#[case] draft: Result<Draft, PostingError>) {
    assert!(matches!(draft, Err(PostingError::Validation(_))));
}

#[test]
fn test_blank_prompt_variant_is_refused_at_issue() {
    let protocol = PostingProtocol::default();
    let mut session = Session::start();

    let result = protocol.begin_preview(&mut session, Draft::Prompt(String::new()));
    assert!(matches!(result, Err(PostingError::Validation(_))));
    assert_eq!(session.phase(), PostingPhase::Idle);
}

#[tokio::test]
async fn test_legacy_post_uses_preview_and_prompt() {
    let server = FakeServer::default();
    let protocol = PostingProtocol::default();
    let mut session = Session::start();

    let index = protocol.preview(&server, &mut session, rent()).await.unwrap();
    let (preview_id, hash) = active_pair(&session);

    let status = protocol
        .post_legacy(&server, &mut session, index)
        .await
        .unwrap();

    assert_eq!(
        status,
        SaveStatus::Saved {
            message: None,
            posted_ids: vec!["L-1".to_string(), "L-2".to_string()],
        }
    );
    {
        let state = server.state.lock().unwrap();
        let request = &state.legacy[0];
        assert_eq!(request.prompt, "Paid rent 400 from cash");
        assert!(request.confirmed);
        assert_eq!(request.journal.len(), 2);
        assert_eq!(request.document_fields, None);
    }

    let err = protocol
        .confirm(&server, &mut session, &preview_id, &hash)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PostingError::Integrity(IntegrityFailure::Consumed { .. })
    ));
}

#[tokio::test]
async fn test_legacy_post_refuses_confirmed_preview() {
    let server = FakeServer::default();
    let protocol = PostingProtocol::default();
    let mut session = Session::start();

    let index = protocol.preview(&server, &mut session, rent()).await.unwrap();
    let saved = protocol.confirm_active(&server, &mut session).await.unwrap();
    assert!(saved.is_saved());

    let err = protocol
        .post_legacy(&server, &mut session, index)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        PostingError::Integrity(IntegrityFailure::Consumed {
            preview_id: "pv-1".to_string(),
        })
    );
    assert!(server.state.lock().unwrap().legacy.is_empty());
    assert_eq!(session.save_status(index), Some(&saved));
}

#[tokio::test]
async fn test_legacy_conflict_on_older_entry_keeps_newer_preview() {
    let server = FakeServer::with(|state| {
        state.legacy_failure = Some(GatewayError::Conflict("already posted".to_string()));
    });
    let protocol = PostingProtocol::default();
    let mut session = Session::start();

    let older = protocol.preview(&server, &mut session, rent()).await.unwrap();
    protocol.preview(&server, &mut session, rent()).await.unwrap();
    assert_eq!(active_pair(&session), ("pv-2".to_string(), "hash-2".to_string()));

    let err = protocol
        .post_legacy(&server, &mut session, older)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PostingError::Integrity(IntegrityFailure::Rejected(_))
    ));
    assert!(matches!(
        session.save_status(older),
        Some(SaveStatus::IntegrityFailed { .. })
    ));
    assert_eq!(session.status(), SessionStatus::Preview);
    assert_eq!(active_pair(&session), ("pv-2".to_string(), "hash-2".to_string()));

    let status = protocol
        .confirm(&server, &mut session, "pv-2", "hash-2")
        .await
        .unwrap();
    assert!(status.is_saved());
}

#[tokio::test]
async fn test_legacy_conflict_on_active_entry_retires_it() {
    let server = FakeServer::with(|state| {
        state.legacy_failure = Some(GatewayError::Conflict("stale".to_string()));
    });
    let protocol = PostingProtocol::default();
    let mut session = Session::start();

    let index = protocol.preview(&server, &mut session, rent()).await.unwrap();
    protocol
        .post_legacy(&server, &mut session, index)
        .await
        .unwrap_err();

    assert!(session.active_preview().is_none());
    assert_eq!(session.status(), SessionStatus::Error);
    assert_eq!(session.phase(), PostingPhase::Failed);
    assert!(matches!(
        protocol.confirm(&server, &mut session, "pv-1", "hash-1").await,
        Err(PostingError::Integrity(IntegrityFailure::Superseded { .. }))
    ));
}

#[tokio::test]
async fn test_refused_confirm_annotates_the_superseded_entry() {
    let server = FakeServer::default();
    let protocol = PostingProtocol::default();
    let mut session = Session::start();

    let older = protocol.preview(&server, &mut session, rent()).await.unwrap();
    let newer = protocol.preview(&server, &mut session, rent()).await.unwrap();

    let err = protocol
        .confirm(&server, &mut session, "pv-1", "hash-1")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PostingError::Integrity(IntegrityFailure::Superseded { .. })
    ));
    assert!(matches!(
        session.save_status(older),
        Some(SaveStatus::IntegrityFailed { .. })
    ));
    assert!(session.save_status(newer).is_none());
    assert_eq!(server.confirms(), 0);
}

#[tokio::test]
async fn test_legacy_post_requires_preview_entry() {
    let server = FakeServer::with(|state| {
        state.preview_body = Some(json!({ "status": "error", "error": "nope" }));
    });
    let protocol = PostingProtocol::default();
    let mut session = Session::start();

    let index = protocol.preview(&server, &mut session, rent()).await.unwrap();
    let missing = protocol.post_legacy(&server, &mut session, index).await;
    let out_of_range = protocol.post_legacy(&server, &mut session, 9).await;

    assert!(matches!(missing, Err(PostingError::Validation(_))));
    assert!(matches!(out_of_range, Err(PostingError::Validation(_))));
}

#[rstest]
#[case(json!({ "success": true }), true, None)]
#[case(json!({ "ok": true }), true, None)]
#[case(json!({ "status": "Saved" }), true, None)]
#[case(json!({ "status": "error", "code": "hash_mismatch" }), false, Some("HASH_MISMATCH"))]
#[case(json!({ "error": "boom" }), false, None)]
#[case(json!({}), true, None)]
#[case(json!("ok"), false, None)]
fn test_post_result_parsing(
    #[case] body: Value,
    #[case] success: bool,
    #[case] code: Option<&str>,
) {
    let result = PostResult::from_value(&body);
    assert_eq!(result.success, success);
    assert_eq!(result.code.as_deref(), code);
}

#[test]
fn test_integrity_codes() {
    let result = PostResult::from_value(&json!({ "success": false, "code": "HASH_MISMATCH" }));
    assert!(result.is_integrity_failure());

    let result = PostResult::from_value(&json!({ "success": false, "code": "PERIOD_CLOSED" }));
    assert!(!result.is_integrity_failure());
}

#[rstest]
#[case(PostingError::Network("down".to_string()), "NETWORK_ERROR", true)]
#[case(PostingError::Validation("bad".to_string()), "VALIDATION_ERROR", false)]
#[case(PostingError::Integrity(IntegrityFailure::NoActivePreview), "INTEGRITY_ERROR", false)]
fn test_error_codes_carry_into_app_error(
    #[case] err: PostingError,
    #[case] code: &str,
    #[case] retryable: bool,
) {
    assert_eq!(err.error_code(), code);
    assert_eq!(err.is_retryable(), retryable);

    let app: AppError = err.into();
    assert_eq!(app.error_code(), code);
    assert_eq!(app.is_retryable(), retryable);
}
