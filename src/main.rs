#[tokio::main]
async fn main() -> anyhow::Result<()> {
    quorum::bootstrapper::run().await
}
