#[tokio::main]
async fn main() -> anyhow::Result<()> {
    school_registry::app::run().await
}
