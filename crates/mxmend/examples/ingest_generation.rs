//! Example: Ingesting generated markup into a document store
//!
//! This example feeds two model generations through the pipeline: a valid
//! full-canvas diagram, then an incremental edit with a duplicated id that
//! is repaired by a canned model before it is merged.

use futures::{
    executor::block_on,
    future::{self, BoxFuture, FutureExt},
};

use mxmend::{
    Pipeline,
    orchestrator::{DocumentStore, FragmentOrigin, HostError, RenderHost},
    repair::{ModelError, RepairModel, RepairPrompt},
};

/// A rendering host that prints what it is asked to load.
struct PrintingHost;

impl RenderHost for PrintingHost {
    fn load<'a>(&'a mut self, xml: &'a str) -> BoxFuture<'a, Result<(), HostError>> {
        println!("host loaded {} bytes", xml.len());
        future::ready(Ok(())).boxed()
    }
}

/// A model that always answers with the same repair response.
struct CannedModel(String);

impl RepairModel for CannedModel {
    fn complete<'a>(
        &'a self,
        prompt: &'a RepairPrompt,
    ) -> BoxFuture<'a, Result<String, ModelError>> {
        println!("model asked to repair:\n{}\n", prompt.user());
        future::ready(Ok(self.0.clone())).boxed()
    }
}

const CANVAS: &str = r#"<mxGraphModel><root>
<mxCell id="0"/><mxCell id="1" parent="0"/>
<mxCell id="client" value="Web Client" vertex="1" parent="1"><mxGeometry x="100" y="100" width="120" height="60" as="geometry"/></mxCell>
<mxCell id="server" value="API Server" vertex="1" parent="1"><mxGeometry x="110" y="104" width="120" height="60" as="geometry"/></mxCell>
<mxCell id="call" edge="1" parent="1" source="client" target="server"><mxGeometry relative="1" as="geometry"/></mxCell>
</root></mxGraphModel>"#;

const EDIT: &str = r#"<mxGraphModel><root>
<mxCell id="0"/><mxCell id="1" parent="0"/>
<mxCell id="server" value="Database" vertex="1" parent="1"><mxGeometry x="100" y="260" width="120" height="80" as="geometry"/></mxCell>
</root></mxGraphModel>"#;

const REPAIRED_EDIT: &str = r#"<mxGraphModel><root><mxCell id="0"/><mxCell id="1" parent="0"/><mxCell id="database" value="Database" vertex="1" parent="1"><mxGeometry x="100" y="260" width="120" height="80" as="geometry"/></mxCell><mxCell id="query" edge="1" parent="1" source="server" target="database"><mxGeometry relative="1" as="geometry"/></mxCell></root></mxGraphModel>"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let pipeline = Pipeline::default();
    let mut store = DocumentStore::new(PrintingHost, Vec::new());

    let idle = CannedModel(String::new());
    let outcome = block_on(pipeline.ingest(
        &mut store,
        &idle,
        CANVAS,
        FragmentOrigin::FullCanvas,
        None,
    ))?;
    println!(
        "canvas: {} cell(s) added, {} overlap(s) resolved\n",
        outcome.apply().cells_added(),
        outcome.calibration().overlaps_resolved()
    );

    // The edit reuses an id with two vertices, which validation rejects.
    let broken = EDIT.replace(
        "</root>",
        r#"<mxCell id="server" vertex="1" parent="1"><mxGeometry width="10" height="10" as="geometry"/></mxCell></root>"#,
    );
    let response =
        serde_json::json!({ "strategy": "display", "xml": REPAIRED_EDIT }).to_string();
    let model = CannedModel(response);

    let outcome = block_on(pipeline.ingest(
        &mut store,
        &model,
        &broken,
        FragmentOrigin::Incremental,
        None,
    ))?;
    println!(
        "edit: repaired in {} attempt(s), {} cell(s) added",
        outcome.repair_attempts(),
        outcome.apply().cells_added()
    );

    println!("\n{}", store.current().to_mxfile("Generated"));
    Ok(())
}
