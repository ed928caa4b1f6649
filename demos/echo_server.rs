//! Line echo server example
//!
//! Accepts TCP connections and serves each one on the task pool through a
//! buffered, timeout-aware `Connection`. Idle workers are released every few
//! seconds and the pool status is printed as JSON.
//!
//! Run with: RUST_LOG=debug cargo run --example echo_server
//! Then: printf 'hello\nworld\n' | nc 127.0.0.1 7878

use rust_task_pool::prelude::*;
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn serve(stream: TcpStream) {
    let config = ConnectionConfig::new()
        .with_read_buf_size(4096)
        .with_write_buf_size(4096)
        .with_read_timeout_ms(30_000)
        .with_write_timeout_ms(5_000);

    let mut conn = match Connection::new(stream, config) {
        Ok(conn) => conn,
        Err(e) => {
            log::warn!("dropping connection: {}", e);
            return;
        }
    };

    loop {
        match conn.read_line() {
            Ok(Some(line)) => {
                // Long lines arrive in buffer-sized pieces; end only the last.
                let text = String::from_utf8_lossy(&line.bytes);
                let end = if line.is_prefix { "" } else { "\r\n" };
                let echoed = conn
                    .printf(format_args!("{}{}", text, end))
                    .and_then(|_| std::io::Write::flush(&mut conn));
                if let Err(e) = echoed {
                    log::warn!("write failed: {}", e);
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                log::debug!("read ended: {}", e);
                break;
            }
        }
    }

    if let Err(e) = conn.close() {
        log::debug!("close failed: {}", e);
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let pool = Arc::new(TaskPool::with_config(
        TaskPoolConfig::new().with_name("echo"),
    )?);
    let listener = TcpListener::bind("127.0.0.1:7878")?;
    println!("=== Echo server listening on {} ===", listener.local_addr()?);

    let reaper = Arc::clone(&pool);
    thread::spawn(move || loop {
        thread::sleep(Duration::from_secs(5));
        let released = reaper.release_idle();
        match reaper.stats().to_json() {
            Ok(json) => println!("released {} idle workers, stats {}", released, json),
            Err(e) => log::warn!("stats unavailable: {}", e),
        }
    });

    for stream in listener.incoming() {
        match stream {
            Ok(stream) => pool.execute(move || serve(stream))?,
            Err(e) => log::warn!("accept failed: {}", e),
        }
    }

    Ok(())
}
