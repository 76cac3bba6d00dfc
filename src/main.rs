#[tokio::main]
async fn main() {
    lexicon::start_server().await;
}
