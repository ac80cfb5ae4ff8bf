//! Track and marker names the chart format assigns meaning to.

pub mod track_names {
    pub const DRUMS: &str = "PART DRUMS";
    pub const VENUE: &str = "VENUE";
    pub const BEAT: &str = "BEAT";
    pub const EVENTS: &str = "EVENTS";
    /// The note track containing the encoded time signature data.
    pub const TIME_SIGNATURE_INPUT: &str = "timesig";
    /// The processed tempo events track.
    pub const TEMPO_MAP: &str = "TEMPO MAP";
}

pub mod event_names {
    pub const CROWD_REALTIME: &str = "[crowd_realtime]";
    pub const CROWD_INTENSE: &str = "[crowd_intense]";
    pub const CROWD_NORMAL: &str = "[crowd_normal]";
    pub const CROWD_MELLOW: &str = "[crowd_mellow]";

    pub const CROWD_CLAP: &str = "[crowd_clap]";
    pub const CROWD_NO_CLAP: &str = "[crowd_noclap]";

    pub const MUSIC_START: &str = "[music_start]";
    pub const MUSIC_END: &str = "[music_end]";
    pub const END: &str = "[end]";
    pub const CODA: &str = "[coda]";

    /// Markers recognised on any events track, besides practice sections.
    pub const SPECIAL: [&str; 10] = [
        CROWD_REALTIME,
        CROWD_INTENSE,
        CROWD_NORMAL,
        CROWD_MELLOW,
        CROWD_CLAP,
        CROWD_NO_CLAP,
        MUSIC_START,
        MUSIC_END,
        END,
        CODA,
    ];
}
