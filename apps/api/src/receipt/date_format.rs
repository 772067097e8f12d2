use chrono::{Datelike, NaiveDate};

/// Ordinal suffix for a day of the month. The 10..=20 band always takes "th",
/// which is what makes 11th, 12th and 13th come out right.
pub fn ordinal_suffix(day: u32) -> &'static str {
    if (10..=20).contains(&(day % 100)) {
        return "th";
    }
    match day % 10 {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    }
}

/// Renders a receipt date, e.g. 2024-12-11 → "11th Dec. 2024".
pub fn format_date(date: NaiveDate) -> String {
    let day = date.day();
    format!(
        "{day}{} {}. {}",
        ordinal_suffix(day),
        date.format("%b"),
        date.year()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_teens_take_th() {
        assert_eq!(format_date(ymd(2024, 12, 11)), "11th Dec. 2024");
        assert_eq!(format_date(ymd(2024, 12, 12)), "12th Dec. 2024");
        assert_eq!(format_date(ymd(2024, 12, 13)), "13th Dec. 2024");
    }

    #[test]
    fn test_first_second_third() {
        assert_eq!(format_date(ymd(2024, 3, 1)), "1st Mar. 2024");
        assert_eq!(format_date(ymd(2024, 3, 2)), "2nd Mar. 2024");
        assert_eq!(format_date(ymd(2024, 3, 3)), "3rd Mar. 2024");
    }

    #[test]
    fn test_twenties_and_thirties() {
        assert_eq!(format_date(ymd(2025, 1, 21)), "21st Jan. 2025");
        assert_eq!(format_date(ymd(2025, 1, 22)), "22nd Jan. 2025");
        assert_eq!(format_date(ymd(2025, 1, 23)), "23rd Jan. 2025");
        assert_eq!(format_date(ymd(2025, 1, 31)), "31st Jan. 2025");
    }

    #[test]
    fn test_band_edges() {
        assert_eq!(ordinal_suffix(10), "th");
        assert_eq!(ordinal_suffix(20), "th");
        assert_eq!(ordinal_suffix(4), "th");
        assert_eq!(ordinal_suffix(30), "th");
    }

    #[test]
    fn test_every_day_of_a_month() {
        for day in 1..=31 {
            let rendered = format_date(ymd(2024, 5, day));
            let expected = match day {
                1 | 21 | 31 => "st",
                2 | 22 => "nd",
                3 | 23 => "rd",
                _ => "th",
            };
            assert!(
                rendered.starts_with(&format!("{day}{expected} May. 2024")),
                "day {day} rendered as {rendered}"
            );
        }
    }
}
