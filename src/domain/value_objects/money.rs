/// Amounts are minor currency units everywhere in the ledger and at the
/// gateway boundary. Major units exist only in client-facing refund totals.
pub fn to_major_units(amount_minor: i64) -> f64 {
    amount_minor as f64 / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minor_unit_totals_convert_to_major_units() {
        assert_eq!(to_major_units(15000), 150.0);
        assert_eq!(to_major_units(1), 0.01);
        assert_eq!(to_major_units(0), 0.0);
    }
}
