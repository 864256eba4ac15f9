use rand::{distributions::Alphanumeric, Rng};

/// Length of a generated basename
pub const NAME_LENGTH: usize = 8;

/// Random 8-character alphanumeric file name with the given extension.
///
/// Not checked against the output folder; collisions are unlikely enough at
/// 62^8 to be ignored.
pub fn random_name(extension: &str) -> String {
    let stem: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(NAME_LENGTH)
        .map(char::from)
        .collect();

    format!("{stem}.{extension}")
}
