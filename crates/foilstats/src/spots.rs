//! Groups sessions into riding spots by where they started.

use crate::models::{Position, Session, Spot};

/// Sessions starting within this many degrees (Euclidean, about 500 m) of a
/// spot's coordinates belong to it.
pub const SPOT_PROXIMITY_DEGREES: f64 = 0.005;

fn degree_distance(a: Position, b: Position) -> f64 {
    ((a.lat - b.lat).powi(2) + (a.lng - b.lng).powi(2)).sqrt()
}

impl Spot {
    fn founded_by(session: &Session, start: Position, ordinal: usize) -> Self {
        Spot {
            id: format!("spot-{:.3}-{:.3}", start.lat, start.lng),
            name: session
                .location
                .clone()
                .unwrap_or_else(|| format!("Spot {ordinal}")),
            coordinates: start,
            sessions_count: 1,
            total_duration: session.stats.total_riding_time,
            best_speed: session.stats.best_max_speed,
            avg_runs_per_session: session.stats.number_of_runs as f64,
            last_visit: session.date,
        }
    }

    fn add_session(&mut self, session: &Session) {
        self.sessions_count += 1;
        self.total_duration += session.stats.total_riding_time;
        self.best_speed = self.best_speed.max(session.stats.best_max_speed);
        let n = self.sessions_count as f64;
        self.avg_runs_per_session =
            (self.avg_runs_per_session * (n - 1.0) + session.stats.number_of_runs as f64) / n;
        if session.date > self.last_visit {
            self.last_visit = session.date;
        }
    }
}

/// Clusters sessions by their first GPS fix. Sessions without positions are
/// ignored. A spot keeps the coordinates of the session that founded it; when
/// a start is near several spots, the most recently founded one wins.
///
/// The result is sorted by session count, most visited first; ties keep
/// founding order.
pub fn group_sessions_into_spots(sessions: &[Session]) -> Vec<Spot> {
    let mut spots: Vec<Spot> = Vec::new();

    for session in sessions {
        let Some(start) = session.start_position() else {
            continue;
        };

        match spots
            .iter_mut()
            .rev()
            .find(|spot| degree_distance(spot.coordinates, start) < SPOT_PROXIMITY_DEGREES)
        {
            Some(spot) => spot.add_session(session),
            None => {
                let ordinal = spots.len() + 1;
                spots.push(Spot::founded_by(session, start, ordinal));
            }
        }
    }

    spots.sort_by(|a, b| b.sessions_count.cmp(&a.sessions_count));
    spots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SampleSeries, SessionStats};
    use time::{Duration, macros::datetime};

    fn session(day: i64, start: Option<Position>, runs: usize, best: f64, location: Option<&str>) -> Session {
        Session {
            id: format!("session_{day}"),
            name: format!("Session {day}"),
            date: datetime!(2024-04-01 11:00 UTC) + Duration::days(day),
            location: location.map(str::to_string),
            total_duration: 3000.0,
            total_distance: 8000.0,
            runs: Vec::new(),
            stats: SessionStats {
                number_of_runs: runs,
                total_riding_time: 600.0,
                best_max_speed: best,
                ..Default::default()
            },
            raw_data: Some(SampleSeries {
                latlng: start.map(|p| vec![p]),
                ..Default::default()
            }),
        }
    }

    #[test]
    fn test_nearby_sessions_share_a_spot() {
        let tarifa = Position::new(36.0143, -5.6044);
        let leucate = Position::new(42.9105, 3.0583);
        let sessions = vec![
            session(0, Some(tarifa), 4, 28.0, Some("Tarifa")),
            session(1, Some(leucate), 2, 24.0, None),
            session(2, Some(Position::new(36.0170, -5.6010)), 6, 31.5, None),
            session(3, None, 9, 40.0, None),
        ];

        let spots = group_sessions_into_spots(&sessions);

        assert_eq!(spots.len(), 2);
        let first = &spots[0];
        assert_eq!(first.id, "spot-36.014--5.604");
        assert_eq!(first.name, "Tarifa");
        assert_eq!(first.coordinates, tarifa);
        assert_eq!(first.sessions_count, 2);
        assert_eq!(first.total_duration, 1200.0);
        assert_eq!(first.best_speed, 31.5);
        assert_eq!(first.avg_runs_per_session, 5.0);
        assert_eq!(first.last_visit, sessions[2].date);

        assert_eq!(spots[1].name, "Spot 2");
        assert_eq!(spots[1].sessions_count, 1);
    }

    #[test]
    fn test_last_visit_is_latest_date() {
        let p = Position::new(43.0, 3.1);
        let sessions = vec![session(10, Some(p), 1, 20.0, None), session(2, Some(p), 1, 20.0, None)];
        let spots = group_sessions_into_spots(&sessions);
        assert_eq!(spots.len(), 1);
        assert_eq!(spots[0].last_visit, sessions[0].date);
    }

    #[test]
    fn test_ambiguous_start_joins_latest_spot() {
        // two spots 0.008 apart, a third start 0.004 from both
        let sessions = vec![
            session(0, Some(Position::new(43.000, 3.1)), 1, 20.0, None),
            session(1, Some(Position::new(43.008, 3.1)), 1, 20.0, None),
            session(2, Some(Position::new(43.004, 3.1)), 1, 20.0, None),
        ];
        let spots = group_sessions_into_spots(&sessions);
        assert_eq!(spots.len(), 2);
        assert_eq!(spots[0].coordinates, Position::new(43.008, 3.1));
        assert_eq!(spots[0].sessions_count, 2);
    }

    #[test]
    fn test_no_sessions() {
        assert!(group_sessions_into_spots(&[]).is_empty());
    }
}
