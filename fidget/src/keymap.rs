//! The keys the operator can press and the command bytes they stand for.

/// The key that ends the session. It is never sent to the slave.
pub const EXIT_KEY: char = 'x';

/// A command understood by the robot firmware, sent as a single byte.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum Command {
    /// Space: stop the wheels.
    Stop = 0,
    /// `W`: drive forward.
    Forward = 1,
    /// `A`: steer left.
    SteerLeft = 2,
    /// `S`: drive backward.
    Backward = 3,
    /// `D`: steer right.
    SteerRight = 4,
    /// `Z`: turn left in place.
    PivotLeft = 5,
    /// `C`: turn right in place.
    PivotRight = 6,
    /// `Q`: pan the camera left.
    CameraLeft = 7,
    /// `E`: pan the camera right.
    CameraRight = 8,
}

impl Command {
    /// Every command, ordered by value.
    pub const ALL: [Command; 9] = [
        Command::Stop,
        Command::Forward,
        Command::SteerLeft,
        Command::Backward,
        Command::SteerRight,
        Command::PivotLeft,
        Command::PivotRight,
        Command::CameraLeft,
        Command::CameraRight,
    ];

    /// Maps a pressed key to its command, ignoring case.
    pub fn from_key(key: char) -> Option<Command> {
        use Command::*;

        match key.to_ascii_lowercase() {
            ' ' => Some(Stop),
            'w' => Some(Forward),
            'a' => Some(SteerLeft),
            's' => Some(Backward),
            'd' => Some(SteerRight),
            'z' => Some(PivotLeft),
            'c' => Some(PivotRight),
            'q' => Some(CameraLeft),
            'e' => Some(CameraRight),
            _ => None,
        }
    }

    /// Gets the key that produces this command.
    pub fn key(self) -> char {
        use Command::*;

        match self {
            Stop => ' ',
            Forward => 'w',
            SteerLeft => 'a',
            Backward => 's',
            SteerRight => 'd',
            PivotLeft => 'z',
            PivotRight => 'c',
            CameraLeft => 'q',
            CameraRight => 'e',
        }
    }

    /// Gets the byte sent over the bus for this command.
    pub fn value(self) -> u8 {
        self as u8
    }

    /// Maps a byte received from the slave back to a command, if it is one.
    pub fn from_value(value: u8) -> Option<Command> {
        Self::ALL.get(value as usize).copied()
    }

    /// Gets the human-readable description shown in the instructions.
    pub fn description(self) -> &'static str {
        use Command::*;

        match self {
            Stop => "stop",
            Forward => "move forward",
            SteerLeft => "steer left",
            Backward => "move backward",
            SteerRight => "steer right",
            PivotLeft => "turn left in place",
            PivotRight => "turn right in place",
            CameraLeft => "turn camera left",
            CameraRight => "turn camera right",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_map_to_fixed_values() {
        let expected = [
            (' ', 0), ('w', 1), ('a', 2), ('s', 3), ('d', 4),
            ('z', 5), ('c', 6), ('q', 7), ('e', 8),
        ];
        for (key, value) in expected {
            assert_eq!(Command::from_key(key).map(Command::value), Some(value), "key {:?}", key);
        }
    }

    #[test]
    fn keys_are_case_insensitive() {
        assert_eq!(Command::from_key('W'), Some(Command::Forward));
        assert_eq!(Command::from_key('E'), Some(Command::CameraRight));
    }

    #[test]
    fn unmapped_keys_are_ignored() {
        assert_eq!(Command::from_key(EXIT_KEY), None);
        assert_eq!(Command::from_key('1'), None);
        assert_eq!(Command::from_key('\r'), None);
        assert_eq!(Command::from_key('é'), None);
    }

    #[test]
    fn values_round_trip_and_stay_in_range() {
        for command in Command::ALL {
            assert!(command.value() <= 8);
            assert_eq!(Command::from_value(command.value()), Some(command));
            assert_eq!(Command::from_key(command.key()), Some(command));
        }
        assert_eq!(Command::from_value(9), None);
        assert_eq!(Command::from_value(255), None);
    }
}
