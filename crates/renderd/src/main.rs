use std::process::ExitCode;

use render_wire::Props;
use renderd::{RenderError, Renderer, RendererOptions, run_service};

fn greet(component: &String, props: &Props) -> Result<String, RenderError> {
    let suffix = if props.flag("exclamate") { "!" } else { "." };
    Ok(format!("hello {component}{suffix}"))
}

fn main() -> ExitCode {
    let result = run_service(|config| {
        let renderer = Renderer::new(RendererOptions::from_config(config, greet));
        renderer.register("gunnar", String::from("gunnar"));
        renderer
    });
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(
                target: concat!(env!("CARGO_PKG_NAME"), "::process"),
                error = %error,
                "render service failed"
            );
            ExitCode::FAILURE
        }
    }
}
