//! 子进程输出读取
//!
//! stdout 和 stderr 共用同一个管道，读取端只有一个，
//! 因此行的顺序就是子进程写入的顺序。
//!
//! gamdl 是 Python 程序，偶尔会输出非 UTF-8 字节。`lines()` 遇到非法
//! UTF-8 会直接终止，所以这里按字节读取行并做有损解码。

use std::io::{BufRead, BufReader, Read};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// 在阻塞线程中读取管道，把每一行发送到 `tx`
///
/// 所有写端关闭（EOF）或接收端关闭时退出，随之释放 `tx`。
pub fn spawn_line_reader(
    stream: impl Read + Send + 'static,
    tx: mpsc::Sender<String>,
) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        let mut reader = BufReader::new(stream);
        let mut buf: Vec<u8> = Vec::with_capacity(1024);

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {
                    let line = decode_line(&mut buf);
                    if tx.blocking_send(line).is_err() {
                        log::debug!("output reader: receiver closed");
                        break;
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => {
                    log::debug!("output reader exiting due to read error: {e}");
                    break;
                }
            }
        }

        log::debug!("output reader task exiting");
    })
}

/// 去掉行尾换行并有损解码
fn decode_line(buf: &mut Vec<u8>) -> String {
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
    String::from_utf8_lossy(buf).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_line() {
        let mut buf = b"hello\r\n".to_vec();
        assert_eq!(decode_line(&mut buf), "hello");

        let mut buf = b"no newline".to_vec();
        assert_eq!(decode_line(&mut buf), "no newline");

        let mut buf = vec![b'o', b'k', 0xFF, b'\n'];
        assert_eq!(decode_line(&mut buf), "ok\u{FFFD}");
    }

    #[tokio::test]
    async fn test_reader_forwards_lines_until_eof() {
        let input: &[u8] = b"first\nsecond\r\nthird";
        let (tx, mut rx) = mpsc::channel(8);
        let handle = spawn_line_reader(input, tx);

        let mut lines = Vec::new();
        while let Some(line) = rx.recv().await {
            lines.push(line);
        }
        assert_eq!(lines, vec!["first", "second", "third"]);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_reader_sees_eof_when_all_writers_close() {
        use std::io::Write;

        let (reader, mut writer) = std::io::pipe().unwrap();
        let mut second = writer.try_clone().unwrap();
        let (tx, mut rx) = mpsc::channel(8);
        spawn_line_reader(reader, tx);

        writeln!(writer, "a").unwrap();
        writeln!(second, "b").unwrap();
        drop(writer);
        drop(second);

        let mut lines = Vec::new();
        while let Some(line) = rx.recv().await {
            lines.push(line);
        }
        assert_eq!(lines, vec!["a", "b"]);
    }
}
