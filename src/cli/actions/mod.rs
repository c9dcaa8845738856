use secrecy::SecretString;

pub mod server;

#[derive(Debug)]
pub enum Action {
    Server {
        port: u16,
        /// `None` selects the in-memory store (demo mode).
        dsn: Option<String>,
        secret: SecretString,
        frontend_url: String,
        production: bool,
    },
}
