//! Market Universe
//!
//! Built-in list of KRW market symbols the board subscribes to when no
//! explicit list is configured.

use std::collections::HashSet;

/// KRW-quoted markets listed on the exchange.
pub const KRW_MARKETS: &[&str] = &[
    "KRW-BTC", "KRW-ETH", "KRW-NEO", "KRW-MTL", "KRW-LTC", "KRW-XRP", "KRW-ETC",
    "KRW-OMG", "KRW-SNT", "KRW-WAVES", "KRW-XEM", "KRW-QTUM", "KRW-LSK", "KRW-STEEM",
    "KRW-XLM", "KRW-ARDR", "KRW-ARK", "KRW-STORJ", "KRW-GRS", "KRW-REP", "KRW-ADA",
    "KRW-SBD", "KRW-POWR", "KRW-BTG", "KRW-ICX", "KRW-EOS", "KRW-TRX", "KRW-SC",
    "KRW-ONT", "KRW-ZIL", "KRW-POLY", "KRW-ZRX", "KRW-LOOM", "KRW-BCH", "KRW-BAT",
    "KRW-IOST", "KRW-RFR", "KRW-CVC", "KRW-IQ", "KRW-IOTA", "KRW-MFT", "KRW-ONG",
    "KRW-GAS", "KRW-UPP", "KRW-ELF", "KRW-KNC", "KRW-BSV", "KRW-THETA", "KRW-EDR",
    "KRW-QKC", "KRW-BTT", "KRW-MOC", "KRW-ENJ", "KRW-TFUEL", "KRW-MANA", "KRW-ANKR",
    "KRW-AERGO", "KRW-ATOM", "KRW-TT", "KRW-CRE", "KRW-MBL", "KRW-WAXP", "KRW-HBAR",
    "KRW-MED", "KRW-MLK", "KRW-STPT", "KRW-ORBS", "KRW-VET", "KRW-CHZ", "KRW-STMX",
    "KRW-DKA", "KRW-HIVE", "KRW-KAVA", "KRW-AHT", "KRW-LINK", "KRW-XTZ", "KRW-BORA",
    "KRW-JST", "KRW-CRO", "KRW-TON", "KRW-SXP", "KRW-HUNT", "KRW-PLA", "KRW-DOT",
    "KRW-SRM", "KRW-MVL", "KRW-PCI", "KRW-STRAX", "KRW-AQT", "KRW-GLM", "KRW-SSX",
    "KRW-META", "KRW-FCT2", "KRW-CBK", "KRW-SAND", "KRW-HUM", "KRW-DOGE", "KRW-1INCH",
    "KRW-ALGO", "KRW-NEAR", "KRW-WEMIX", "KRW-AVAX", "KRW-T", "KRW-CELO", "KRW-GMT",
    "KRW-APT", "KRW-SHIB", "KRW-MASK", "KRW-ARB", "KRW-EGLD", "KRW-BLUR", "KRW-ID",
    "KRW-SUI", "KRW-SEI", "KRW-CYBER", "KRW-MATIC", "KRW-SOL", "KRW-ASTR", "KRW-UNI",
    "KRW-FLOW", "KRW-MNT", "KRW-USDC", "KRW-XEC", "KRW-USDT", "KRW-BNB", "KRW-ONDO",
    "KRW-ETHFI", "KRW-STRK", "KRW-PYTH", "KRW-ALT", "KRW-JUP", "KRW-MANTA", "KRW-WIF",
    "KRW-DYM", "KRW-AUCTION", "KRW-LINA", "KRW-NU", "KRW-NKN", "KRW-PUNDIX", "KRW-GRT",
    "KRW-POLYX", "KRW-AXS", "KRW-TEMCO", "KRW-HIBS", "KRW-WIKEN", "KRW-FLUX",
    "KRW-GMX", "KRW-KLEVA", "KRW-ADX", "KRW-PROS", "KRW-STG", "KRW-GALA", "KRW-BAKE",
    "KRW-PROPC", "KRW-HPO", "KRW-CTC", "KRW-ARKM", "KRW-NTRN", "KRW-REQ", "KRW-ALTB",
    "KRW-UXLINK", "KRW-MANTRA", "KRW-XNO", "KRW-BZNT", "KRW-FX", "KRW-VALOR",
    "KRW-LBXC", "KRW-CARRY", "KRW-GOM2", "KRW-SMC", "KRW-ARW", "KRW-VIC", "KRW-IPX",
    "KRW-VSYS", "KRW-BIOT", "KRW-DAWN", "KRW-JAM", "KRW-IGNIS", "KRW-LAMB", "KRW-OGN",
    "KRW-WNCG", "KRW-CKB", "KRW-MDT", "KRW-POLA", "KRW-KLAY", "KRW-STX", "KRW-TRUMP",
    "KRW-WCT"
];

/// The built-in KRW universe as owned symbols, in listing order.
#[must_use]
pub fn krw_markets() -> Vec<String> {
    dedup_markets(KRW_MARKETS.iter().copied())
}

/// Normalize a market list: trims and upper-cases each symbol, drops empty
/// entries and keeps only the first occurrence of each symbol.
#[must_use]
pub fn dedup_markets<I, S>(markets: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    markets
        .into_iter()
        .map(|m| m.as_ref().trim().to_ascii_uppercase())
        .filter(|m| !m.is_empty())
        .filter(|m| seen.insert(m.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_list_has_no_duplicates() {
        let markets = krw_markets();
        assert_eq!(markets.len(), KRW_MARKETS.len());
        assert_eq!(markets.first().map(String::as_str), Some("KRW-BTC"));
    }

    #[test]
    fn built_in_list_is_krw_quoted() {
        assert!(KRW_MARKETS.iter().all(|m| m.starts_with("KRW-")));
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let markets = dedup_markets(["krw-eth", " KRW-BTC ", "KRW-ETH", "", "KRW-XRP"]);
        assert_eq!(markets, ["KRW-ETH", "KRW-BTC", "KRW-XRP"]);
    }
}
