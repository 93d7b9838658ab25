const TWELVE_POINT: [(f64, u8); 12] = [
    (92.0, 12),
    (83.0, 11),
    (75.0, 10),
    (67.0, 9),
    (58.0, 8),
    (50.0, 7),
    (42.0, 6),
    (33.0, 5),
    (25.0, 4),
    (17.0, 3),
    (8.0, 2),
    (1.0, 1),
];

const FIVE_POINT: [(f64, u8); 3] = [(90.0, 5), (70.0, 4), (50.0, 3)];

fn lookup(table: &[(f64, u8)], percentage: f64, floor: u8) -> u8 {
    table
        .iter()
        .find(|(threshold, _)| percentage >= *threshold)
        .map(|(_, grade)| *grade)
        .unwrap_or(floor)
}

pub fn grade_12(percentage: f64) -> u8 {
    lookup(&TWELVE_POINT, percentage, 0)
}

pub fn grade_5(percentage: f64) -> u8 {
    lookup(&FIVE_POINT, percentage, 2)
}

pub fn percentage(correct: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        correct as f64 / total as f64 * 100.0
    }
}
