use std::path::PathBuf;

use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, RedisError};
use serial_test::serial;
use tempfile::TempDir;
use tokio::time::{sleep, Duration};

use rudis::server::run;

/// Boots a server on `port` with a fresh append-only file and connects to it.
/// The temp dir handle keeps the file alive for the duration of the test.
async fn start_server(port: u16) -> (MultiplexedConnection, TempDir) {
    let dir = TempDir::new().unwrap();
    let aof_path = dir.path().join("rudis.aof");

    let connection = start_server_with_aof(port, aof_path).await;

    (connection, dir)
}

async fn start_server_with_aof(port: u16, aof_path: PathBuf) -> MultiplexedConnection {
    tokio::spawn(run(port, aof_path));
    sleep(Duration::from_millis(100)).await;

    let client = redis::Client::open(format!("redis://127.0.0.1:{port}/")).unwrap();
    client.get_multiplexed_async_connection().await.unwrap()
}

#[tokio::test]
#[serial]
async fn ping_and_echo() {
    let (mut con, _dir) = start_server(63800).await;

    let pong: String = redis::cmd("PING").query_async(&mut con).await.unwrap();
    assert_eq!(pong, "PONG");

    let msg: String = redis::cmd("PING")
        .arg("hello")
        .query_async(&mut con)
        .await
        .unwrap();
    assert_eq!(msg, "hello");

    let msg: String = redis::cmd("ECHO")
        .arg("hello")
        .query_async(&mut con)
        .await
        .unwrap();
    assert_eq!(msg, "hello");
}

#[tokio::test]
#[serial]
async fn set_then_get() {
    let (mut con, _dir) = start_server(63801).await;

    let ok: String = con.set("key1", "value1").await.unwrap();
    assert_eq!(ok, "OK");

    let value: Option<String> = con.get("key1").await.unwrap();
    assert_eq!(value, Some("value1".to_string()));

    let missing: Option<String> = con.get("never-set").await.unwrap();
    assert_eq!(missing, None);
}

#[tokio::test]
#[serial]
async fn set_with_expiry_round_trip() {
    let (mut con, _dir) = start_server(63802).await;

    let _: String = redis::cmd("SET")
        .arg("key1")
        .arg("value1")
        .arg("EX")
        .arg(1)
        .query_async(&mut con)
        .await
        .unwrap();

    let value: Option<String> = con.get("key1").await.unwrap();
    assert_eq!(value, Some("value1".to_string()));

    sleep(Duration::from_millis(1100)).await;

    let value: Option<String> = con.get("key1").await.unwrap();
    assert_eq!(value, None);
}

#[tokio::test]
#[serial]
async fn set_with_millisecond_expiry() {
    let (mut con, _dir) = start_server(63803).await;

    let _: String = redis::cmd("SET")
        .arg("key1")
        .arg("value1")
        .arg("PX")
        .arg(200)
        .query_async(&mut con)
        .await
        .unwrap();

    let value: Option<String> = con.get("key1").await.unwrap();
    assert_eq!(value, Some("value1".to_string()));

    sleep(Duration::from_millis(300)).await;

    let value: Option<String> = con.get("key1").await.unwrap();
    assert_eq!(value, None);
}

#[tokio::test]
#[serial]
async fn set_rejects_malformed_expiry() {
    let (mut con, _dir) = start_server(63804).await;

    let err: RedisError = redis::cmd("SET")
        .arg("key1")
        .arg("value1")
        .arg("XX")
        .arg(1)
        .query_async::<_, String>(&mut con)
        .await
        .unwrap_err();
    assert_eq!(err.detail(), Some("syntax error"));

    let err: RedisError = redis::cmd("SET")
        .arg("key1")
        .arg("value1")
        .arg("EX")
        .arg("soon")
        .query_async::<_, String>(&mut con)
        .await
        .unwrap_err();
    assert_eq!(err.detail(), Some("value is not an integer or out of range"));
}

#[tokio::test]
#[serial]
async fn incr_and_decr() {
    let (mut con, _dir) = start_server(63805).await;

    let value: i64 = redis::cmd("INCR")
        .arg("counter")
        .query_async(&mut con)
        .await
        .unwrap();
    assert_eq!(value, 1);

    let value: i64 = redis::cmd("INCR")
        .arg("counter")
        .query_async(&mut con)
        .await
        .unwrap();
    assert_eq!(value, 2);

    let value: i64 = redis::cmd("INCR")
        .arg("counter")
        .query_async(&mut con)
        .await
        .unwrap();
    assert_eq!(value, 3);

    let value: i64 = redis::cmd("DECR")
        .arg("counter")
        .query_async(&mut con)
        .await
        .unwrap();
    assert_eq!(value, 2);

    let _: String = con.set("words", "not a number").await.unwrap();
    let err: RedisError = redis::cmd("INCR")
        .arg("words")
        .query_async::<_, i64>(&mut con)
        .await
        .unwrap_err();
    assert_eq!(err.detail(), Some("value is not an integer or out of range"));
}

#[tokio::test]
#[serial]
async fn list_push_and_range() {
    let (mut con, _dir) = start_server(63806).await;

    let length: i64 = con.lpush("left", "a").await.unwrap();
    assert_eq!(length, 1);
    let length: i64 = con.lpush("left", "b").await.unwrap();
    assert_eq!(length, 2);

    let elements: Vec<String> = con.lrange("left", 0, -1).await.unwrap();
    assert_eq!(elements, vec!["b".to_string(), "a".to_string()]);

    let length: i64 = con.rpush("right", "a").await.unwrap();
    assert_eq!(length, 1);
    let length: i64 = con.rpush("right", "b").await.unwrap();
    assert_eq!(length, 2);

    let elements: Vec<String> = con.lrange("right", 0, -1).await.unwrap();
    assert_eq!(elements, vec!["a".to_string(), "b".to_string()]);

    let elements: Vec<String> = con.lrange("missing", 0, -1).await.unwrap();
    assert!(elements.is_empty());
}

#[tokio::test]
#[serial]
async fn list_commands_reject_string_keys() {
    let (mut con, _dir) = start_server(63807).await;

    let _: String = con.set("key1", "value1").await.unwrap();

    let err: RedisError = con
        .lpush::<_, _, i64>("key1", "a")
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some("WRONGTYPE"));

    let err: RedisError = con
        .rpush::<_, _, i64>("key1", "a")
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some("WRONGTYPE"));

    let err: RedisError = con
        .lrange::<_, Vec<String>>("key1", 0, -1)
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some("WRONGTYPE"));
}

#[tokio::test]
#[serial]
async fn exists_and_del() {
    let (mut con, _dir) = start_server(63808).await;

    let _: String = con.set("a", "1").await.unwrap();

    let count: i64 = redis::cmd("EXISTS")
        .arg("a")
        .arg("b")
        .arg("c")
        .query_async(&mut con)
        .await
        .unwrap();
    assert_eq!(count, 1);

    let removed: i64 = redis::cmd("DEL")
        .arg("a")
        .arg("b")
        .arg("c")
        .query_async(&mut con)
        .await
        .unwrap();
    assert_eq!(removed, 1);

    let count: i64 = redis::cmd("EXISTS").arg("a").query_async(&mut con).await.unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
#[serial]
async fn arity_errors_name_the_command() {
    let (mut con, _dir) = start_server(63809).await;

    let err: RedisError = redis::cmd("GET")
        .query_async::<_, Option<String>>(&mut con)
        .await
        .unwrap_err();
    assert_eq!(
        err.detail(),
        Some("wrong number of arguments for 'get' command")
    );

    let err: RedisError = redis::cmd("LRANGE")
        .arg("list1")
        .arg(0)
        .query_async::<_, Vec<String>>(&mut con)
        .await
        .unwrap_err();
    assert_eq!(
        err.detail(),
        Some("wrong number of arguments for 'lrange' command")
    );
}

#[tokio::test]
#[serial]
async fn unknown_commands_are_reported() {
    let (mut con, _dir) = start_server(63810).await;

    let err: RedisError = redis::cmd("FROB")
        .arg("a")
        .arg("b")
        .query_async::<_, String>(&mut con)
        .await
        .unwrap_err();

    let detail = err.detail().unwrap();
    assert!(detail.contains("unknown command 'frob'"));
    assert!(detail.contains("'a' 'b'"));
}

#[tokio::test]
#[serial]
async fn commands_survive_a_restart() {
    let dir = TempDir::new().unwrap();
    let aof_path = dir.path().join("rudis.aof");

    {
        let mut con = start_server_with_aof(63811, aof_path.clone()).await;

        let _: String = con.set("key1", "value1").await.unwrap();
        let _: i64 = redis::cmd("INCR")
            .arg("counter")
            .query_async(&mut con)
            .await
            .unwrap();
        let _: i64 = con.rpush("list1", "a").await.unwrap();
        let _: i64 = con.rpush("list1", "b").await.unwrap();
        let _: i64 = redis::cmd("DEL").arg("key1").query_async(&mut con).await.unwrap();
    }

    // A second server replays the same append-only file; it must come up with
    // state equivalent to the one the commands built directly.
    let mut con = start_server_with_aof(63812, aof_path).await;

    let value: Option<String> = con.get("key1").await.unwrap();
    assert_eq!(value, None);

    let value: Option<String> = con.get("counter").await.unwrap();
    assert_eq!(value, Some("1".to_string()));

    let elements: Vec<String> = con.lrange("list1", 0, -1).await.unwrap();
    assert_eq!(elements, vec!["a".to_string(), "b".to_string()]);
}
