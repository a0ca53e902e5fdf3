use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let admin_token = std::env::var("MOCK_ADMIN_TOKEN").unwrap_or_else(|_| "admin".to_string());
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    let state = mock_server::MockState::new(&admin_token, &format!("http://{addr}"));
    println!("listening on {addr}");
    mock_server::run(listener, state).await
}
