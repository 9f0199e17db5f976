//! Time-sliced reader pump

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};

const READ_BUFFER: usize = 64 * 1024;

/// Read `reader` until EOF, emitting whatever accumulated every `period`.
///
/// The remainder is flushed at EOF, after which `tx` is dropped so the
/// receiver observes the end of the stream.
pub async fn slice_stream<R>(mut reader: R, period: Duration, tx: mpsc::Sender<Vec<u8>>)
where
    R: AsyncRead + Unpin,
{
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // first tick completes immediately
    ticker.tick().await;

    let mut pending: Vec<u8> = Vec::new();
    let mut buf = vec![0u8; READ_BUFFER];

    loop {
        tokio::select! {
            read = reader.read(&mut buf) => match read {
                Ok(0) => break,
                Ok(n) => pending.extend_from_slice(&buf[..n]),
                Err(e) => {
                    warn!(error = %e, "capture stream read failed");
                    break;
                }
            },
            _ = ticker.tick() => {
                if pending.is_empty() {
                    continue;
                }
                if tx.send(std::mem::take(&mut pending)).await.is_err() {
                    debug!("slice receiver dropped");
                    return;
                }
            }
        }
    }

    if !pending.is_empty() {
        let _ = tx.send(pending).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[tokio::test(start_paused = true)]
    async fn emits_on_period_and_flushes_at_eof() {
        let (mut writer, reader) = tokio::io::duplex(1024);
        let (tx, mut rx) = mpsc::channel(8);
        let pump = tokio::spawn(slice_stream(reader, Duration::from_secs(1), tx));

        writer.write_all(b"abc").await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), b"abc");

        writer.write_all(b"de").await.unwrap();
        drop(writer);
        assert_eq!(rx.recv().await.unwrap(), b"de");
        assert!(rx.recv().await.is_none());

        pump.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn quiet_periods_emit_nothing() {
        let (writer, reader) = tokio::io::duplex(64);
        let (tx, mut rx) = mpsc::channel(8);
        tokio::spawn(slice_stream(reader, Duration::from_millis(100), tx));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err());

        drop(writer);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn stops_when_receiver_goes_away() {
        let (mut writer, reader) = tokio::io::duplex(64);
        let (tx, rx) = mpsc::channel(1);
        let pump = tokio::spawn(slice_stream(reader, Duration::from_millis(10), tx));
        drop(rx);

        writer.write_all(b"x").await.unwrap();
        pump.await.unwrap();
    }
}
