use rand::Rng;
use rand::rngs::OsRng;

/// Code numérique saisi par l'utilisateur (le jeton opaque est un UUID à part)
pub fn generate(length: usize) -> String {
    (0..length)
        .map(|_| char::from(b'0' + OsRng.gen_range(0..10u8)))
        .collect()
}

/// Comparaison en temps constant (pas de sortie anticipée sur le premier octet différent)
pub fn constant_time_eq(given: &[u8], saved: &[u8]) -> bool {
    if given.len() != saved.len() {
        return false;
    }

    given
        .iter()
        .zip(saved.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}
