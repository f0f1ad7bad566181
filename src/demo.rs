//! Demonstration processor served by the binary.

use serde_json::json;

use action_router::http::{RequestView, ResponseBuilder};
use action_router::routing::{ActionResult, ActionTable, Mapper, MappingError, Processor};

pub struct Demo;

impl Demo {
    fn index(&self, _req: &RequestView) -> ActionResult {
        ResponseBuilder::ok_with(|res| {
            res.set_html_body(
                "<h1>action-router</h1>\
                 <p>Try <code>/hello/you</code>, <code>POST /echo</code> or <code>/status/402</code>.</p>",
            );
            Ok(())
        })
    }

    fn hello(&self, req: &RequestView) -> ActionResult {
        let name = req.path_variable("name").unwrap_or("world");
        ResponseBuilder::ok_with(|res| {
            res.set_body(format!("hello, {name}"));
            Ok(())
        })
    }

    fn echo(&self, req: &RequestView) -> ActionResult {
        let data = req.data()?;
        ResponseBuilder::ok_with(|res| {
            res.set_json_body(&data)?;
            Ok(())
        })
    }

    fn status(&self, req: &RequestView) -> ActionResult {
        let code = req.path_variable("code").and_then(|c| c.parse::<u16>().ok());
        match code.and_then(ResponseBuilder::for_code) {
            Some(res) => Ok(res),
            None => ResponseBuilder::unprocessable_entity_with(|res| {
                res.set_json_body(&json!({ "error": "unsupported status code" }))?;
                Ok(())
            }),
        }
    }

    fn not_found(&self, req: &RequestView) -> ActionResult {
        ResponseBuilder::not_found_status_with(|res| {
            res.set_json_body(&json!({ "error": "not found", "path": req.path() }))?;
            Ok(())
        })
    }
}

impl Processor for Demo {
    fn actions(table: &mut ActionTable<Self>) {
        table
            .register("index", Self::index)
            .register("hello", Self::hello)
            .register("echo", Self::echo)
            .register("status", Self::status)
            .register("not_found", Self::not_found);
    }
}

/// Bind the demo routes.
pub fn bind_routes(mapper: &mut Mapper<Demo>) -> Result<(), MappingError> {
    mapper
        .get("/", "index")?
        .get("/hello/:name", "hello")?
        .post("/echo", "echo")?
        .put("/echo", "echo")?
        .get("/status/:code", "status")?;
    Ok(())
}
