use cli_test_dir::*;
use std::{
    env,
    io::{BufRead, BufReader, Write},
    net::TcpListener,
    thread,
};

/// A tiny trip file, with a timestamp column that needs normalizing.
const TRIPS_CSV: &str = "VendorID,tpep_pickup_datetime,tpep_dropoff_datetime,trip_distance
1,2021-01-01 00:30:10,2021-01-01 00:36:12,2.10
2,2021-01-01 00:51:20,,0.20
1,2021-01-01 00:43:30,2021-01-01 01:11:06,14.70
";

/// The URL of our test database.
fn postgres_test_url() -> String {
    env::var("POSTGRES_TEST_URL").unwrap_or_else(|_| {
        "postgres://postgres:@localhost:5432/tripload_test".to_owned()
    })
}

/// Run a single SQL statement against our test database, returning the first
/// column of the first row, if any.
fn pg_query_i64(sql: &str) -> Option<i64> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    runtime.block_on(async {
        let (client, connection) =
            tokio_postgres::connect(&postgres_test_url(), tokio_postgres::NoTls)
                .await
                .unwrap();
        tokio::spawn(connection);
        let rows = client.query(sql, &[]).await.unwrap();
        rows.first().map(|row| row.get::<_, i64>(0))
    })
}

/// Serve `body` over HTTP to the next `count` requests, returning the URL of
/// the served file.
fn serve_file(file_name: &str, body: &'static str, count: usize) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        for stream in listener.incoming().take(count) {
            let mut stream = stream.unwrap();
            let mut rdr = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            // Skip the request line and headers.
            while rdr.read_line(&mut line).unwrap() > 0 && line != "\r\n" {
                line.clear();
            }
            write!(
                stream,
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body,
            )
            .unwrap();
        }
    });
    format!("http://{}/{}", addr, file_name)
}

#[test]
fn help_flag() {
    let testdir = TestDir::new("tripload", "help_flag");
    let output = testdir.cmd().arg("--help").expect_success();
    assert!(output.stdout_str().contains("tripload"));
    assert!(output.stdout_str().contains("ingest"));
    assert!(output.stdout_str().contains("sync"));
}

#[test]
fn version_flag() {
    let testdir = TestDir::new("tripload", "version_flag");
    let output = testdir.cmd().arg("--version").expect_success();
    assert!(output.stdout_str().contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn ingest_help_flag() {
    let testdir = TestDir::new("tripload", "ingest_help_flag");
    let output = testdir.cmd().args(["ingest", "--help"]).expect_success();
    assert!(output.stdout_str().contains("--table_name"));
    assert!(output.stdout_str().contains("EXAMPLE:"));
}

#[test]
fn ingest_requires_connection_flags() {
    let testdir = TestDir::new("tripload", "ingest_requires_connection_flags");
    let output = testdir
        .cmd()
        .args(["ingest", "--url", "https://example.com/trips.csv"])
        .expect_failure();
    assert!(output.stderr_str().contains("--user"));
}

#[test]
fn ingest_rejects_non_numeric_port() {
    let testdir = TestDir::new("tripload", "ingest_rejects_non_numeric_port");
    testdir
        .cmd()
        .args([
            "ingest",
            "--user=root",
            "--password=root",
            "--host=localhost",
            "--port=postgres",
            "--db=ny_taxi",
            "--table_name=trips",
            "--url=https://example.com/trips.csv",
        ])
        .expect_failure();
}

#[test]
fn unknown_log_format_is_rejected() {
    let testdir = TestDir::new("tripload", "unknown_log_format_is_rejected");
    let output = testdir
        .cmd()
        .args(["--log-format=yaml", "sync"])
        .expect_failure();
    assert!(output.stderr_str().contains("unknown log format"));
}

#[test]
fn config_edits_are_saved() {
    let testdir = TestDir::new("tripload", "config_edits_are_saved");
    let config_dir = testdir.path("config");
    testdir
        .cmd()
        .env("TRIPLOAD_CONFIG_DIR", &config_dir)
        .args(["config", "set", "bucket", "green-archive"])
        .expect_success();
    testdir
        .cmd()
        .env("TRIPLOAD_CONFIG_DIR", &config_dir)
        .args(["config", "add", "months", "11"])
        .expect_success();
    testdir
        .cmd()
        .env("TRIPLOAD_CONFIG_DIR", &config_dir)
        .args(["config", "add", "months", "12"])
        .expect_success();
    testdir
        .cmd()
        .env("TRIPLOAD_CONFIG_DIR", &config_dir)
        .args(["config", "rm", "months", "11"])
        .expect_success();
    testdir.expect_contains("config/tripload.toml", "bucket = \"green-archive\"");
    testdir.expect_contains("config/tripload.toml", "months = [\"12\"]");
}

#[test]
fn config_rejects_unknown_keys() {
    let testdir = TestDir::new("tripload", "config_rejects_unknown_keys");
    let output = testdir
        .cmd()
        .env("TRIPLOAD_CONFIG_DIR", testdir.path("config"))
        .args(["config", "set", "colour", "green"])
        .expect_failure();
    assert!(output.stderr_str().contains("unknown configuration key"));
    testdir.expect_no_such_path("config/tripload.toml");
}

#[test]
fn config_set_refuses_list_keys() {
    let testdir = TestDir::new("tripload", "config_set_refuses_list_keys");
    testdir
        .cmd()
        .env("TRIPLOAD_CONFIG_DIR", testdir.path("config"))
        .args(["config", "set", "months", "01"])
        .expect_failure();
}

#[test]
#[ignore]
fn ingest_csv_into_postgres_twice() {
    let testdir = TestDir::new("tripload", "ingest_csv_into_postgres_twice");
    let url = postgres_test_url().parse::<url::Url>().unwrap();
    let file_url = serve_file("yellow_tripdata_2021-01.csv", TRIPS_CSV, 2);
    let table_name = "ingest_csv_into_postgres_twice";
    let port = url.port().unwrap_or(5432).to_string();
    pg_query_i64(&format!("DROP TABLE IF EXISTS {}", table_name));

    for _ in 0..2 {
        let output = testdir
            .cmd()
            .args([
                "ingest",
                &format!("--user={}", url.username()),
                &format!("--password={}", url.password().unwrap_or("")),
                &format!("--host={}", url.host_str().unwrap()),
                &format!("--port={}", port),
                &format!("--db={}", url.path().trim_start_matches('/')),
                &format!("--table_name={}", table_name),
                &format!("--url={}", file_url),
            ])
            .tee_output()
            .expect_success();
        assert!(output.stdout_str().contains("Inserted chunk 1, took "));
        assert!(output
            .stdout_str()
            .contains("Finished ingesting data into the postgres database"));
    }
    testdir.expect_path("output.csv");

    // Appends are never deduplicated.
    let count = pg_query_i64(&format!("SELECT COUNT(*) FROM {}", table_name));
    assert_eq!(count, Some(6));
}
