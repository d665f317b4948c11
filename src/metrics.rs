//! Client-side activity history and the small calculations the views share.

use crate::api::types::{DayReport, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    NewUsers,
    NewFriendships,
    Interactions,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::NewUsers, Metric::NewFriendships, Metric::Interactions];

    pub fn title(self) -> &'static str {
        match self {
            Metric::NewUsers => "New Users",
            Metric::NewFriendships => "New Friendships",
            Metric::Interactions => "Interactions",
        }
    }
}

/// One day's worth of deltas
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DayActivity {
    pub users: u64,
    pub friendships: u64,
    pub interactions: u64,
}

impl DayActivity {
    pub fn get(&self, metric: Metric) -> u64 {
        match metric {
            Metric::NewUsers => self.users,
            Metric::NewFriendships => self.friendships,
            Metric::Interactions => self.interactions,
        }
    }
}

impl From<&DayReport> for DayActivity {
    fn from(report: &DayReport) -> Self {
        Self {
            users: report.new_users,
            friendships: report.new_friendships,
            interactions: report.total_interactions,
        }
    }
}

/// Ordered per-day history, lost when the dashboard exits
#[derive(Debug, Clone, Default)]
pub struct ActivityHistory {
    days: Vec<DayActivity>,
}

impl ActivityHistory {
    pub fn push(&mut self, day: DayActivity) {
        self.days.push(day);
    }

    pub fn clear(&mut self) {
        self.days.clear();
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Chart points, x = day number starting at 1
    pub fn series(&self, metric: Metric) -> Vec<(f64, f64)> {
        self.days
            .iter()
            .enumerate()
            .map(|(i, d)| ((i + 1) as f64, d.get(metric) as f64))
            .collect()
    }

    pub fn total(&self, metric: Metric) -> u64 {
        self.days.iter().map(|d| d.get(metric)).sum()
    }

    pub fn latest(&self, metric: Metric) -> u64 {
        self.days.last().map(|d| d.get(metric)).unwrap_or(0)
    }

    pub fn max(&self, metric: Metric) -> u64 {
        self.days.iter().map(|d| d.get(metric)).max().unwrap_or(0)
    }
}

/// Interest score as a percentage of `max`, clamped to 0..=100
pub fn percent_from_score(score: f64, max: f64) -> u16 {
    if !(max > 0.0) || !score.is_finite() {
        return 0;
    }
    (score / max * 100.0).round().clamp(0.0, 100.0) as u16
}

fn out_of_range(total_users: u64) -> String {
    format!("User ID must be between 1 and {}", total_users)
}

/// Parse a user ID typed by the user and check it against the known count
pub fn validate_user_id(input: &str, total_users: u64) -> Result<UserId, String> {
    let id: UserId = input.trim().parse().map_err(|_| out_of_range(total_users))?;
    check_user_id(id, total_users)
}

/// Range check for an already parsed ID
pub fn check_user_id(id: UserId, total_users: u64) -> Result<UserId, String> {
    if (1..=total_users).contains(&id) {
        Ok(id)
    } else {
        Err(out_of_range(total_users))
    }
}

/// Thousands separators, e.g. 12345 -> "12,345"
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(users: u64, friendships: u64, interactions: u64) -> DayActivity {
        DayActivity { users, friendships, interactions }
    }

    #[test]
    fn test_percent_from_score() {
        assert_eq!(percent_from_score(9.0, 15.0), 60);
        assert_eq!(percent_from_score(15.0, 15.0), 100);
        assert_eq!(percent_from_score(30.0, 15.0), 100);
        assert_eq!(percent_from_score(-3.0, 15.0), 0);
        assert_eq!(percent_from_score(1.0, 15.0), 7);
        assert_eq!(percent_from_score(5.0, 0.0), 0);
        assert_eq!(percent_from_score(f64::NAN, 15.0), 0);
    }

    #[test]
    fn test_validate_user_id() {
        assert_eq!(validate_user_id("317", 500), Ok(317));
        assert_eq!(validate_user_id(" 1 ", 500), Ok(1));
        assert_eq!(validate_user_id("500", 500), Ok(500));

        let expected = Err("User ID must be between 1 and 500".to_string());
        assert_eq!(validate_user_id("0", 500), expected);
        assert_eq!(validate_user_id("501", 500), expected);
        assert_eq!(validate_user_id("", 500), expected);
        assert_eq!(validate_user_id("abc", 500), expected);
        assert_eq!(validate_user_id("-4", 500), expected);
    }

    #[test]
    fn test_check_parsed_id() {
        assert_eq!(check_user_id(1, 10), Ok(1));
        assert_eq!(check_user_id(10, 10), Ok(10));
        assert_eq!(check_user_id(11, 10), Err("User ID must be between 1 and 10".to_string()));
        assert!(check_user_id(0, 10).is_err());
    }

    #[test]
    fn test_validate_with_no_users() {
        assert!(validate_user_id("1", 0).is_err());
    }

    #[test]
    fn test_history_totals_and_series() {
        let mut history = ActivityHistory::default();
        assert_eq!(history.latest(Metric::NewUsers), 0);

        history.push(day(10, 22, 140));
        history.push(day(5, 3, 60));

        assert_eq!(history.len(), 2);
        assert_eq!(history.total(Metric::NewUsers), 15);
        assert_eq!(history.total(Metric::Interactions), 200);
        assert_eq!(history.latest(Metric::NewFriendships), 3);
        assert_eq!(history.max(Metric::Interactions), 140);
        assert_eq!(history.series(Metric::NewUsers), vec![(1.0, 10.0), (2.0, 5.0)]);

        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.total(Metric::NewUsers), 0);
    }

    #[test]
    fn test_day_activity_from_report() {
        let report = DayReport {
            new_users: 10,
            total_users: Some(510),
            new_friendships: 22,
            total_friendships: None,
            total_interactions: 140,
        };
        assert_eq!(DayActivity::from(&report), day(10, 22, 140));
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(1234567), "1,234,567");
    }
}
