use mesh_viewer::config::ViewerConfig;
use tracing::info;
use tracing_subscriber::{filter::LevelFilter, EnvFilter, FmtSubscriber};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting mesh viewer");
    let config = ViewerConfig::load().with_args(std::env::args_os().skip(1));

    run(config)
}

#[cfg(target_os = "macos")]
fn run(config: ViewerConfig) -> Result<(), Box<dyn std::error::Error>> {
    mesh_viewer::app::App::run(config)
}

#[cfg(not(target_os = "macos"))]
fn run(config: ViewerConfig) -> Result<(), Box<dyn std::error::Error>> {
    use tracing::error;

    error!("Rendering requires Metal, which is only available on macOS");

    let mesh = mesh_viewer::mesh::load_mesh(&config.mesh_path)?;
    info!(
        "Imported {}: {} vertices, {} triangles, {} materials, {} submeshes",
        config.mesh_path.display(),
        mesh.vertices().len(),
        mesh.triangle_count(),
        mesh.materials().len(),
        mesh.submeshes().len()
    );
    Ok(())
}
