//! I/O boundary: JSON Lines in, JSON Lines out
//!
//! Transactions arrive as one JSON document per line. The reader streams
//! them with constant memory; a line that fails to parse is logged with its
//! line number and skipped, it never aborts the run. Decisions leave the
//! same way, one JSON document per line on the output writer.

use std::io::Write;
use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tracing::warn;

use crate::types::{RewardDecision, Transaction};

/// Streaming reader of line-delimited JSON transactions
pub struct JsonlReader<R: AsyncBufRead + Unpin> {
    lines: Lines<R>,
    line_no: usize,
}

impl JsonlReader<BufReader<File>> {
    /// Open a JSONL transaction file for streaming
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file cannot be opened.
    pub async fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = File::open(path).await?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: AsyncBufRead + Unpin> JsonlReader<R> {
    /// Wrap an async buffered reader producing JSONL
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
        }
    }

    /// Next well-formed transaction, or `None` at end of input
    ///
    /// Blank lines and lines that fail to parse are skipped with a warning.
    /// An I/O error on the underlying reader ends the stream.
    pub async fn next_transaction(&mut self) -> Option<Transaction> {
        loop {
            self.line_no += 1;
            let line = match self.lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => return None,
                Err(e) => {
                    warn!(line = self.line_no, error = %e, "input read failed, ending stream");
                    return None;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Transaction>(&line) {
                Ok(txn) => return Some(txn),
                Err(e) => {
                    warn!(line = self.line_no, error = %e, "skipping malformed transaction");
                }
            }
        }
    }
}

/// Write one decision as a JSON line
///
/// # Errors
///
/// Returns the I/O error from the underlying writer. Serialization of a
/// [`RewardDecision`] itself cannot fail.
pub fn write_decision<W: Write>(writer: &mut W, decision: &RewardDecision) -> std::io::Result<()> {
    serde_json::to_writer(&mut *writer, decision)?;
    writer.write_all(b"\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DecisionMeta, Persona, ReasonCode, RewardType, TxnType};
    use rust_decimal::Decimal;

    fn reader(input: &str) -> JsonlReader<BufReader<&[u8]>> {
        JsonlReader::new(BufReader::new(input.as_bytes()))
    }

    #[tokio::test]
    async fn test_reads_transactions_in_order() {
        let input = concat!(
            r#"{"txn_id":"t-1","user_id":"u-1","merchant_id":"m-1","amount":"100","txn_type":"PAYMENT","ts":"2026-08-24T10:00:00Z"}"#,
            "\n",
            r#"{"txn_id":"t-2","user_id":"u-2","merchant_id":"m-1","amount":"33.5","txn_type":"REFUND","ts":"2026-08-24T10:01:00Z"}"#,
            "\n",
        );
        let mut reader = reader(input);

        let first = reader.next_transaction().await.unwrap();
        assert_eq!(first.txn_id, "t-1");
        assert_eq!(first.amount, Decimal::new(100, 0));
        assert_eq!(first.txn_type, TxnType::Payment);

        let second = reader.next_transaction().await.unwrap();
        assert_eq!(second.txn_id, "t-2");
        assert_eq!(second.amount, Decimal::new(335, 1));

        assert!(reader.next_transaction().await.is_none());
    }

    #[tokio::test]
    async fn test_skips_malformed_and_blank_lines() {
        let input = concat!(
            "not json at all\n",
            "\n",
            r#"{"txn_id":"t-1"}"#,
            "\n",
            r#"{"txn_id":"t-2","user_id":"u-1","merchant_id":"m-1","amount":"10","txn_type":"PAYMENT","ts":"2026-08-24T10:00:00Z"}"#,
            "\n",
        );
        let mut reader = reader(input);

        let only = reader.next_transaction().await.unwrap();
        assert_eq!(only.txn_id, "t-2");
        assert!(reader.next_transaction().await.is_none());
    }

    #[tokio::test]
    async fn test_empty_input_yields_nothing() {
        assert!(reader("").next_transaction().await.is_none());
    }

    #[test]
    fn test_write_decision_emits_one_line() {
        let decision = RewardDecision {
            decision_id: "d-1".to_string(),
            policy_version: "v1".to_string(),
            reward_type: RewardType::Cashback,
            reward_value: 10,
            xp: 150,
            reason_codes: vec![ReasonCode::CashbackGranted],
            meta: DecisionMeta {
                persona: Persona::New,
                daily_cac_used: 0,
                daily_cac_limit: 200,
            },
        };

        let mut out = Vec::new();
        write_decision(&mut out, &decision).unwrap();

        let line = String::from_utf8(out).unwrap();
        assert!(line.ends_with('\n'));
        let restored: RewardDecision = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(restored, decision);
    }
}
