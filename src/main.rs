#[tokio::main]
async fn main() -> anyhow::Result<()> {
    scribe_desk::run().await
}
