use chrono::NaiveDate;

/// mints receipt numbers, one per payment event
///
/// Numbers read `{prefix}-{yyyymmdd}-{sequence}` with a six digit sequence
/// that keeps counting across dates, so two calls never return the same
/// number from one issuer.
#[derive(Debug, Clone)]
pub struct ReceiptIssuer {
    prefix: String,
    issued: u64,
}

impl ReceiptIssuer {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self::resume(prefix, 0)
    }

    /// continue numbering after `issued` receipts
    pub fn resume(prefix: impl Into<String>, issued: u64) -> Self {
        Self {
            prefix: prefix.into(),
            issued,
        }
    }

    pub fn issue(&mut self, date: NaiveDate) -> String {
        self.issued += 1;
        format!("{}-{}-{:06}", self.prefix, date.format("%Y%m%d"), self.issued)
    }

    pub fn issued(&self) -> u64 {
        self.issued
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_receipt_format() {
        let mut issuer = ReceiptIssuer::new("REC");
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();

        assert_eq!(issuer.issue(date), "REC-20240309-000001");
        assert_eq!(issuer.issue(date), "REC-20240309-000002");
        assert_eq!(issuer.issued(), 2);
    }

    #[test]
    fn test_receipts_never_repeat() {
        let mut issuer = ReceiptIssuer::resume("R", 41);
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();

        let numbers: HashSet<String> = (0..500).map(|_| issuer.issue(date)).collect();
        assert_eq!(numbers.len(), 500);
        assert!(numbers.contains("R-20240309-000042"));
    }
}
