use crate::app_env::test::TEST_DB_URL;
use crate::db;
use dotenv::dotenv;
use lazy_static::lazy_static;
use rand::{Rng, thread_rng};
use sqlx::{Connection, PgConnection, PgPool};
use std::env;
use std::future::Future;
use tokio::runtime::Runtime;

lazy_static! {
    static ref TOKIO_RT: Runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Tokio runtime failed to initialize");
}

/// A throwaway database which is dropped along with this value
struct TestDatabase {
    base_url: String,
    db_name: String,
}

impl TestDatabase {
    async fn create(base_url: &str) -> Result<Self, sqlx::Error> {
        let db_id: u32 = thread_rng().gen_range(10_000..99_999);
        let db_name = format!("test_db_{db_id}");

        let mut conn = PgConnection::connect(base_url).await?;
        let create_result = sqlx::query(&format!("CREATE DATABASE {db_name}"))
            .execute(&mut conn)
            .await;
        conn.close().await?;
        create_result?;

        Ok(TestDatabase {
            base_url: base_url.to_owned(),
            db_name,
        })
    }

    fn url(&self) -> String {
        format!("{}/{}", self.base_url, self.db_name)
    }
}

impl Drop for TestDatabase {
    fn drop(&mut self) {
        let base_url = self.base_url.clone();
        let db_name = self.db_name.clone();

        // Must never be dropped from inside TOKIO_RT
        TOKIO_RT.block_on(async move {
            let drop_result = async {
                let mut conn = PgConnection::connect(&base_url).await?;
                sqlx::query(&format!("DROP DATABASE IF EXISTS {db_name} WITH (FORCE)"))
                    .execute(&mut conn)
                    .await?;
                conn.close().await
            }
            .await;

            if let Err(error) = drop_result {
                println!(
                    "Warning: failed to drop test database {db_name}, you may need to do it manually. Error: {error}"
                );
            }
        });
    }
}

/// Creates a fresh, migrated database for a single test and hands the test a pool connected
/// to it. The database is removed once the test finishes.
///
/// Expects that the TEST_DB_URL environment variable is populated with a server URL that has
/// no database name in the path.
pub fn prepare_db_and_test<F, R>(test_fn: F)
where
    R: Future<Output = ()>,
    F: FnOnce(PgPool) -> R,
{
    if dotenv().is_err() {
        println!("Test is running without .env file.");
    }

    let pg_connection_base_url = env::var(TEST_DB_URL).unwrap_or_else(|_| {
        panic!("You must provide the {TEST_DB_URL} environment variable as the base postgres connection string")
    });

    let test_db = TOKIO_RT.block_on(async {
        TestDatabase::create(&pg_connection_base_url)
            .await
            .unwrap_or_else(|db_err| panic!("Failed to start test database: {db_err}"))
    });

    TOKIO_RT.block_on(async {
        let sqlx_pool = db::connect_sqlx(&test_db.url())
            .await
            .expect("Could not connect to the test database");
        db::migrate(&sqlx_pool)
            .await
            .expect("Could not migrate the test database");

        test_fn(sqlx_pool.clone()).await;
        sqlx_pool.close().await;
    });

    drop(test_db);
}
