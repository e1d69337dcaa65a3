//! Cue dispatch: where a detected class change ends up.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::classifier::VoiceClass;
use crate::config::AudioConfig;

/// Receives one call per cue the engine decides to play.
pub trait CueSink {
    fn dispatch_cue(&mut self, class: VoiceClass);
}

impl<F> CueSink for F
where
    F: FnMut(VoiceClass),
{
    fn dispatch_cue(&mut self, class: VoiceClass) {
        self(class)
    }
}

/// Host-side sound playback.
pub trait SfxPlayer {
    /// Play a sound file once.
    fn post_custom_sfx(&mut self, path: &Path);
}

/// Sound file per cued class.
#[derive(Debug, Clone)]
pub struct CueLibrary {
    directory: PathBuf,
    ar: String,
    shotgun: String,
    sniper: String,
    grenade: String,
}

impl CueLibrary {
    /// Build from config, resolving the audio directory against `base`
    /// unless it is already absolute.
    pub fn new(config: &AudioConfig, base: &Path) -> Self {
        Self {
            directory: base.join(&config.directory),
            ar: config.ar.clone(),
            shotgun: config.shotgun.clone(),
            sniper: config.sniper.clone(),
            grenade: config.grenade.clone(),
        }
    }

    /// Get the directory sound files are read from.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path of the sound for a class. `VoiceClass::None` has no sound.
    pub fn resolve(&self, class: VoiceClass) -> Option<PathBuf> {
        let file = match class {
            VoiceClass::None => return None,
            VoiceClass::Ar => &self.ar,
            VoiceClass::Shotgun => &self.shotgun,
            VoiceClass::Sniper => &self.sniper,
            VoiceClass::Grenade => &self.grenade,
        };
        Some(self.directory.join(file))
    }
}

/// Plays the library's file for each cue.
///
/// A missing file is logged and skipped; it never fails the dispatch.
#[derive(Debug)]
pub struct AudioCueSink<P> {
    library: CueLibrary,
    player: P,
    missing: usize,
}

impl<P: SfxPlayer> AudioCueSink<P> {
    pub fn new(library: CueLibrary, player: P) -> Self {
        Self {
            library,
            player,
            missing: 0,
        }
    }

    pub fn library(&self) -> &CueLibrary {
        &self.library
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    /// Cues skipped because their file was missing.
    pub fn missing(&self) -> usize {
        self.missing
    }
}

impl<P: SfxPlayer> CueSink for AudioCueSink<P> {
    fn dispatch_cue(&mut self, class: VoiceClass) {
        let Some(path) = self.library.resolve(class) else {
            return;
        };

        if !path.is_file() {
            self.missing += 1;
            warn!(%class, path = %path.display(), "cue file not found");
            return;
        }

        debug!(%class, path = %path.display(), "playing cue");
        self.player.post_custom_sfx(&path);
    }
}
