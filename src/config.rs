// config.rs
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub port: u16,
}

impl Config {
    pub fn init() -> Config {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let jwt_secret = std::env::var("JWT_SECRET_KEY").expect("JWT_SECRET_KEY must be set");
        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8000".to_string());

        Config {
            database_url,
            jwt_secret,
            port: port.parse::<u16>().expect("PORT must be a number"),
        }
    }
}
