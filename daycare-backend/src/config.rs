// src/config.rs
use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_addr: String,
    pub jwt_secret: String,
    /// 定期パージの実行間隔（時間）。0 でスケジューラ無効。
    pub purge_interval_hours: u64,
    pub backup_dir: String,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenv().ok(); // .env ファイルを読み込む (存在しなくてもエラーにしない)

        let database_url = env::var("DATABASE_URL")?;
        let server_addr = env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let jwt_secret = env::var("JWT_SECRET")?;
        let purge_interval_hours = env::var("PURGE_INTERVAL_HOURS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(24);
        let backup_dir =
            env::var("BACKUP_DIR").unwrap_or_else(|_| "/var/backups/daycare".to_string());

        Ok(Config {
            database_url,
            server_addr,
            jwt_secret,
            purge_interval_hours,
            backup_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purge_interval_defaults_to_daily() {
        env::remove_var("PURGE_INTERVAL_HOURS");
        env::set_var("DATABASE_URL", "postgres://localhost/daycare_test");
        env::set_var("JWT_SECRET", "test-secret");

        let config = Config::from_env().unwrap();
        assert_eq!(config.purge_interval_hours, 24);
        assert_eq!(config.server_addr, "0.0.0.0:3000");
    }
}
