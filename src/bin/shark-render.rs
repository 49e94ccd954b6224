use shark_render::{parse_document, RenderError, Renderer, RendererConfig};
use std::env;
use std::fs;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    let mut page_path = None;
    let mut config_path = None;
    let mut rest = args[1..].iter();
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--config" => config_path = rest.next().cloned(),
            _ if page_path.is_none() => page_path = Some(arg.clone()),
            _ => {
                eprintln!("Unexpected argument: {}", arg);
                usage();
            }
        }
    }

    let Some(page_path) = page_path else {
        usage();
    };

    if let Err(e) = render_file(&page_path, config_path.as_deref()) {
        eprintln!("✗ {} could not be rendered:", page_path);
        print_error(&e);
        process::exit(1);
    }
}

fn usage() -> ! {
    eprintln!("Usage: shark-render <page.yaml> [--config renderer.yaml]");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  shark-render demos/landing.yaml");
    eprintln!("  RUST_LOG=debug shark-render page.yaml --config renderer.yaml");
    process::exit(1);
}

fn read(path: &str) -> Result<String, RenderError> {
    fs::read_to_string(path)
        .map_err(|e| RenderError::InvalidConfig(format!("Failed to read {}: {}", path, e)))
}

fn render_file(path: &str, config_path: Option<&str>) -> Result<(), RenderError> {
    let config = match config_path {
        Some(config_path) => RendererConfig::from_yaml(&read(config_path)?)?,
        None => RendererConfig::default(),
    };

    let document = parse_document(&read(path)?)?;
    let mut renderer = Renderer::with_config(config)?;
    document.render(&mut renderer)?;
    let output = renderer.finish();

    println!("<!-- html -->");
    print!("{}", output.html);
    if !output.css.is_empty() {
        println!("<!-- css -->");
        println!("{}", output.css);
    }
    if !output.script.is_empty() {
        println!("<!-- js -->");
        println!("{}", output.script);
    }
    for resource in output.style_resources.iter().chain(&output.script_resources) {
        println!("<!-- {} {}:{} {} -->", resource.kind, resource.module, resource.name, resource.url);
    }
    Ok(())
}

fn print_error(error: &RenderError) {
    match error {
        RenderError::Conversion { rule, value, reason } => {
            eprintln!("  Invalid value {} for rule '{}':", value, rule);
            eprintln!("    {}", reason);
        }
        RenderError::Yaml(msg) => {
            eprintln!("  YAML error:");
            eprintln!("    {}", msg);
        }
        RenderError::InvalidConfig(msg) => {
            eprintln!("  Configuration error:");
            eprintln!("    {}", msg);
        }
        e => {
            eprintln!("  {}", e);
        }
    }
}
