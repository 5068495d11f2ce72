use rand::Rng;
use serde::Serialize;

/// Callsign pools for generated players.
const FIRST_NAMES: [&str; 10] = [
    "Shadow", "Blaze", "Viper", "Razor", "Storm", "Ghost", "Nova", "Frost", "Titan", "Echo",
];
const LAST_NAMES: [&str; 10] = [
    "Reaper", "Hunter", "Striker", "Phantom", "Destroyer", "Sniper", "Warrior", "Slayer",
    "Knight", "Demon",
];

pub const ELO_MIN: i32 = 1000;
pub const ELO_MAX: i32 = 2000;

/// Prefill for the add-player form; becomes the POST /api/player/add
/// body. The server assigns the id and join time.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NewPlayer {
    pub name: String,
    pub elo: i32,
    pub ping: i32,
}

/// Generate a plausible player: pooled callsign, elo ~ N(1500, 150)
/// clamped to the ladder bounds, ping uniform in 15-80 ms.
pub fn random_player(rng: &mut impl Rng) -> NewPlayer {
    let first = FIRST_NAMES[rng.gen_range(0..FIRST_NAMES.len())];
    let last = LAST_NAMES[rng.gen_range(0..LAST_NAMES.len())];
    let tag: u32 = rng.gen_range(10..100);

    NewPlayer {
        name: format!("{}{}{}", first, last, tag),
        elo: ((1500.0 + 150.0 * standard_normal(rng)).round() as i32).clamp(ELO_MIN, ELO_MAX),
        ping: rng.gen_range(15..=80),
    }
}

/// Sum of 12 uniforms, recentered: a cheap N(0, 1) approximation.
fn standard_normal(rng: &mut impl Rng) -> f64 {
    let sum: f64 = (0..12).map(|_| rng.gen::<f64>()).sum();
    sum - 6.0
}
