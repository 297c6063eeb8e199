//! Integration tests for the Pipeline API
//!
//! These tests drive the public API end to end with scripted model and
//! rendering host collaborators.

use std::{cell::RefCell, collections::VecDeque};

use futures::{
    executor::block_on,
    future::{self, AbortHandle, BoxFuture, FutureExt},
};

use mxmend::{
    ErrorCode, MendError, Pipeline,
    config::{AppConfig, CalibrationConfig, ModelRuntime, RepairConfig},
    orchestrator::{ApplyMode, DocumentStore, FragmentOrigin, HostError, RenderHost},
    repair::{ModelError, RepairError, RepairModel, RepairPrompt},
};

const VALID: &str = r#"<mxGraphModel><root>
<mxCell id="0"/><mxCell id="1" parent="0"/>
<mxCell id="a" value="A" vertex="1" parent="1"><mxGeometry x="100" y="100" width="120" height="60" as="geometry"/></mxCell>
<mxCell id="b" value="B" vertex="1" parent="1"><mxGeometry x="100" y="100" width="120" height="60" as="geometry"/></mxCell>
<mxCell id="e" edge="1" parent="1" source="a" target="b"><mxGeometry relative="1" as="geometry"/></mxCell>
</root></mxGraphModel>"#;

const DUPLICATED: &str = r#"<mxGraphModel><root>
<mxCell id="0"/><mxCell id="1" parent="0"/>
<mxCell id="a" vertex="1" parent="1"><mxGeometry x="0" y="0" width="40" height="40" as="geometry"/></mxCell>
<mxCell id="a" vertex="1" parent="1"><mxGeometry x="80" y="0" width="40" height="40" as="geometry"/></mxCell>
</root></mxGraphModel>"#;

/// Replies with canned responses in order and records every prompt.
struct ScriptedModel {
    responses: RefCell<VecDeque<String>>,
    prompts: RefCell<Vec<String>>,
}

impl ScriptedModel {
    fn new(responses: &[&str]) -> Self {
        Self {
            responses: RefCell::new(responses.iter().map(|r| r.to_string()).collect()),
            prompts: RefCell::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.prompts.borrow().len()
    }
}

impl RepairModel for ScriptedModel {
    fn complete<'a>(&'a self, prompt: &'a RepairPrompt) -> BoxFuture<'a, Result<String, ModelError>> {
        self.prompts.borrow_mut().push(prompt.user().to_string());
        let reply = self
            .responses
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| ModelError::new("no scripted response left"));
        future::ready(reply).boxed()
    }
}

#[derive(Default)]
struct Host {
    loads: usize,
}

impl RenderHost for Host {
    fn load<'a>(&'a mut self, _xml: &'a str) -> BoxFuture<'a, Result<(), HostError>> {
        self.loads += 1;
        future::ready(Ok(())).boxed()
    }
}

fn display(xml: &str) -> String {
    serde_json::json!({ "strategy": "display", "xml": xml }).to_string()
}

#[test]
fn test_pipeline_default_config() {
    let pipeline = Pipeline::default();

    assert_eq!(pipeline.config().calibration().grid_size(), 8.0);
    assert_eq!(pipeline.config().repair().max_attempts(), 2);
}

#[test]
fn test_process_overlapping_vertices() {
    let output = Pipeline::default().process(VALID).expect("valid markup");
    let document = mxmend_parser::parse_document(output.xml()).unwrap();

    let a = document.get("a").unwrap().geometry().unwrap();
    let b = document.get("b").unwrap().geometry().unwrap();
    assert_eq!((a.x(), a.y()), (Some(104.0), Some(104.0)));
    assert_eq!((b.x(), b.y()), (Some(264.0), Some(104.0)));
    assert_eq!(output.report().overlaps_resolved(), 1);
}

#[test]
fn test_process_with_custom_grid() {
    let config = AppConfig::new(
        CalibrationConfig::default().with_grid_size(10.0),
        RepairConfig::default(),
    );
    let output = Pipeline::new(config).process(VALID).unwrap();

    assert_eq!(output.report().grid_size(), 10.0);
    assert!(output.xml().contains(r#"x="260""#));
}

#[test]
fn test_process_reports_all_errors() {
    let err = Pipeline::default().process(DUPLICATED).unwrap_err();

    let MendError::Parse { err, .. } = err else {
        panic!("expected parse error, got {err:?}");
    };
    assert_eq!(err.diagnostics().len(), 1);
    assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::DuplicateId));
}

#[test]
fn test_report_serializes_wire_names() {
    let output = Pipeline::default().process(VALID).unwrap();
    let json = serde_json::to_value(output.report()).unwrap();

    assert_eq!(json["overlapsResolved"], 1);
    assert_eq!(json["nodesAdjusted"], 2);
    assert!(json.get("connectorWaypointsCleared").is_some());
}

#[test]
fn test_edit_response_contract() {
    let xml = Pipeline::default()
        .apply_repair_response(
            r#"{"strategy":"edit","edits":[{"search":"A","replace":"B"}]}"#,
            Some("...A..."),
        )
        .unwrap();

    assert_eq!(xml, "...B...");
}

#[test]
fn test_repair_succeeds_on_second_attempt() {
    let model = ScriptedModel::new(&[&display(DUPLICATED), &display(VALID)]);
    let repaired =
        block_on(Pipeline::default().repair(&model, DUPLICATED, None, None)).expect("repaired");

    assert_eq!(repaired.attempts(), 2);
    assert_eq!(model.calls(), 2);
    let prompts = model.prompts.borrow();
    assert!(prompts[0].contains("duplicate-id"));
    assert!(prompts[1].contains("duplicate-id"));
    assert!(mxmend_parser::validate(repaired.xml()).is_valid());
}

#[test]
fn test_repair_sends_normalized_markup() {
    let generated = format!("Sure! Here it is:\n```xml\n{DUPLICATED}\n```\nHope this helps");
    let model = ScriptedModel::new(&[&display(VALID)]);
    block_on(Pipeline::default().repair(&model, &generated, None, None)).expect("repaired");

    let prompts = model.prompts.borrow();
    assert!(prompts[0].contains(&format!("Invalid XML:\n{DUPLICATED}")));
    assert!(!prompts[0].contains("```"));
    assert!(!prompts[0].contains("Hope this helps"));
}

#[test]
fn test_repair_exhausts_attempts() {
    let config = AppConfig::new(
        CalibrationConfig::default(),
        RepairConfig::new(ModelRuntime::default(), 3),
    );
    let bad = display(DUPLICATED);
    let model = ScriptedModel::new(&[&bad, &bad, &bad, &bad]);
    let err = block_on(Pipeline::new(config).repair(&model, DUPLICATED, None, None)).unwrap_err();

    assert!(matches!(err, RepairError::Exhausted { attempts: 3, .. }));
    assert_eq!(model.calls(), 3);
}

#[test]
fn test_repair_edit_against_current() {
    let current = VALID.replace(r#"value="B""#, r#"value="Old""#);
    let model = ScriptedModel::new(&[
        r#"{"strategy":"edit","edits":[{"search":"value=\"Old\"","replace":"value=\"New\""}],"notes":"renamed"}"#,
    ]);
    let repaired = block_on(Pipeline::default().repair(
        &model,
        DUPLICATED,
        Some(&current),
        None,
    ))
    .unwrap();

    assert!(repaired.xml().contains(r#"value="New""#));
    assert_eq!(repaired.notes(), Some("renamed"));
}

#[test]
fn test_repair_can_be_cancelled() {
    let (handle, registration) = AbortHandle::new_pair();
    handle.abort();
    let model = ScriptedModel::new(&[&display(VALID)]);
    let err = block_on(Pipeline::default().repair(&model, DUPLICATED, None, Some(registration)))
        .unwrap_err();

    assert!(matches!(err, RepairError::Cancelled));
    assert_eq!(model.calls(), 0);
}

#[test]
fn test_ingest_valid_markup_skips_repair() {
    let pipeline = Pipeline::default();
    let mut store = DocumentStore::new(Host::default(), Vec::new());
    let model = ScriptedModel::new(&[]);

    let outcome = block_on(pipeline.ingest(
        &mut store,
        &model,
        VALID,
        FragmentOrigin::FullCanvas,
        None,
    ))
    .unwrap();

    assert_eq!(outcome.repair_attempts(), 0);
    assert_eq!(outcome.apply().mode(), ApplyMode::Replaced);
    assert_eq!(outcome.apply().cells_added(), 3);
    assert_eq!(outcome.calibration().overlaps_resolved(), 1);
    assert_eq!(store.host().loads, 1);
    assert_eq!(store.history().len(), 1);
    let b = store.current().get("b").unwrap().geometry().unwrap();
    assert_eq!(b.x(), Some(264.0));
}

#[test]
fn test_ingest_repairs_then_merges() {
    let pipeline = Pipeline::default();
    let mut store = DocumentStore::new(Host::default(), Vec::new());
    let idle = ScriptedModel::new(&[]);
    block_on(pipeline.ingest(&mut store, &idle, VALID, FragmentOrigin::FullCanvas, None)).unwrap();

    let fixed = r#"<mxGraphModel><root><mxCell id="0"/><mxCell id="1" parent="0"/><mxCell id="c" vertex="1" parent="1"><mxGeometry x="0" y="400" width="40" height="40" as="geometry"/></mxCell></root></mxGraphModel>"#;
    let model = ScriptedModel::new(&[&display(fixed)]);
    let outcome = block_on(pipeline.ingest(
        &mut store,
        &model,
        DUPLICATED,
        FragmentOrigin::Incremental,
        None,
    ))
    .unwrap();

    assert_eq!(outcome.repair_attempts(), 1);
    assert_eq!(outcome.apply().mode(), ApplyMode::Merged);
    assert!(store.current().get("a").is_some());
    assert!(store.current().get("c").is_some());
    // The store's document was offered as the edit base.
    assert!(model.prompts.borrow()[0].contains("Current XML"));
}

#[test]
fn test_ingest_surfaces_repair_failure() {
    let pipeline = Pipeline::default();
    let mut store = DocumentStore::new(Host::default(), Vec::new());
    let model = ScriptedModel::new(&[r#"{"strategy":"rewrite"}"#]);

    let err = block_on(pipeline.ingest(
        &mut store,
        &model,
        DUPLICATED,
        FragmentOrigin::FullCanvas,
        None,
    ))
    .unwrap_err();

    assert!(matches!(
        err,
        MendError::Repair(RepairError::UnknownStrategy(_))
    ));
    assert_eq!(store.host().loads, 0);
}
