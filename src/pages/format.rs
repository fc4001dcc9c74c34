// Russian display formatting for tour pages

use chrono::{Datelike, NaiveDate};

const MONTHS_GENITIVE: [&str; 12] = [
    "января",
    "февраля",
    "марта",
    "апреля",
    "мая",
    "июня",
    "июля",
    "августа",
    "сентября",
    "октября",
    "ноября",
    "декабря",
];

/// Whole hours of a duration in minutes: `1 час`, otherwise `N часа`
pub fn format_hours(minutes: i64) -> String {
    let hours = minutes.div_euclid(60);
    if hours == 1 {
        format!("{hours} час")
    } else {
        format!("{hours} часа")
    }
}

/// Day and month, e.g. `10 июля`
pub fn format_date_ru(date: NaiveDate) -> String {
    format!("{} {}", date.day(), MONTHS_GENITIVE[date.month0() as usize])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_hours() {
        assert_eq!(format_hours(60), "1 час");
        assert_eq!(format_hours(119), "1 час");
        assert_eq!(format_hours(120), "2 часа");
        assert_eq!(format_hours(180), "3 часа");
        assert_eq!(format_hours(30), "0 часа");
    }

    #[test]
    fn test_format_date_ru() {
        let date = NaiveDate::from_ymd_opt(2024, 7, 10).unwrap();
        assert_eq!(format_date_ru(date), "10 июля");
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert_eq!(format_date_ru(date), "1 января");
    }
}
