// Plain-text reports printed by the command line.

use std::fmt::Write;

use crate::atlas::*;

const RULE_WIDTH: usize = 52;

/// Writes an integer with commas between groups of three digits.
pub fn format_number(num: i64) -> String {
    let digits = num.unsigned_abs().to_string();
    let mut res = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if num < 0 {
        res.push('-');
    }
    for (idx, c) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            res.push(',');
        }
        res.push(c);
    }
    res
}

pub fn national_summary(year: i32, national: &NationalView, parties: &PartyLabels) -> String {
    let mut s = String::new();
    let _ = writeln!(s, "National results for {}:", year);
    let _ = writeln!(
        s,
        "{}: {} ({:.1}%)",
        parties.a,
        format_number(national.votes_a),
        national.pct_a * 100.0
    );
    let _ = writeln!(
        s,
        "{}: {} ({:.1}%)",
        parties.b,
        format_number(national.votes_b),
        national.pct_b * 100.0
    );
    let _ = writeln!(s, "Total: {}", format_number(national.votes_total));
    s
}

/// The per-state table: one row per state, then a TOTAL row.
pub fn summary_table(year: i32, states: &[StateView], parties: &PartyLabels) -> String {
    let rule = "-".repeat(RULE_WIDTH);
    let mut s = String::new();
    let _ = writeln!(s, "\nElection results for {}:", year);
    let _ = writeln!(
        s,
        "{:<20}{:>12}{:>12}{:>8}",
        "State", parties.a, parties.b, "Winner"
    );
    let _ = writeln!(s, "{}", rule);

    let (mut total_a, mut total_b) = (0_i64, 0_i64);
    for st in states.iter() {
        total_a += st.votes_a;
        total_b += st.votes_b;
        let _ = writeln!(
            s,
            "{:<20}{:>12}{:>12}{:>8}",
            st.name,
            st.votes_a,
            st.votes_b,
            parties.label(st.winner)
        );
    }

    let _ = writeln!(s, "{}", rule);
    let _ = writeln!(
        s,
        "{:<20}{:>12}{:>12}{:>8}",
        "TOTAL",
        total_a,
        total_b,
        parties.label(Party::winner(total_a, total_b))
    );
    s
}

pub fn store_info(county_count: usize, years: &[i32]) -> String {
    let years: Vec<String> = years.iter().map(|y| y.to_string()).collect();
    format!(
        "Counties in database: {}\nElection years: {}\n",
        county_count,
        years.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(code: &str, name: &str, a: i64, b: i64) -> StateView {
        StateView {
            code: code.to_string(),
            name: name.to_string(),
            votes_a: a,
            votes_b: b,
            votes_total: a + b,
            pct_a: 0.0,
            pct_b: 0.0,
            winner: Party::winner(a, b),
            geojson: "null".to_string(),
        }
    }

    #[test]
    fn numbers() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
        assert_eq!(format_number(-123456), "-123,456");
    }

    #[test]
    fn table() {
        let states = vec![
            state("01", "Alabama", 20, 10),
            state("06", "California", 1000, 1200),
        ];
        let text = summary_table(2024, &states, &PartyLabels::default());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "");
        assert_eq!(lines[1], "Election results for 2024:");
        assert_eq!(
            lines[2],
            "State                        GOP         DEM  Winner"
        );
        assert_eq!(lines[3], "-".repeat(52));
        assert_eq!(
            lines[4],
            "Alabama                       20          10     GOP"
        );
        assert_eq!(
            lines[5],
            "California                  1000        1200     DEM"
        );
        assert_eq!(
            lines[7],
            "TOTAL                       1020        1210     DEM"
        );
        assert!(lines.iter().all(|l| l.len() <= 52));
    }

    #[test]
    fn tied_total_goes_to_b() {
        let states = vec![state("01", "Alabama", 5, 5)];
        let text = summary_table(2020, &states, &PartyLabels::default());
        assert!(text.lines().last().unwrap().ends_with("DEM"));
    }

    #[test]
    fn national() {
        let national = NationalView {
            votes_a: 1000,
            votes_b: 1200,
            votes_total: 2200,
            pct_a: 1000.0 / 2200.0,
            pct_b: 1200.0 / 2200.0,
            winner: Party::B,
        };
        assert_eq!(
            national_summary(2024, &national, &PartyLabels::default()),
            "National results for 2024:\nGOP: 1,000 (45.5%)\nDEM: 1,200 (54.5%)\nTotal: 2,200\n"
        );
    }

    #[test]
    fn info() {
        assert_eq!(
            store_info(3143, &[2024, 2020]),
            "Counties in database: 3143\nElection years: 2024, 2020\n"
        );
        assert_eq!(store_info(0, &[]), "Counties in database: 0\nElection years: \n");
    }
}
