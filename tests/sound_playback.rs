//! End-to-end sound effect tests, from file on disk to mixed frames.
//!
//! Runs entirely in software: clips are pushed through the mixer directly
//! instead of opening a real output device.

mod helpers;

use chime::mixer::Mixer;
use chime::sound::Sound;
use chime::{PlaybackState, Wave};

#[test]
fn load_wav_and_play_to_completion() {
    let dir = tempfile::tempdir().unwrap();
    let path = helpers::write_sine_wav(&dir, "beep.wav", 2205, 22050, 1);

    let wave = Wave::load(&path).unwrap();
    assert_eq!(wave.sample_rate, 22050);
    assert!((wave.duration_seconds() - 0.1).abs() < 0.01);

    let mut mixer = Mixer::new(22050);
    let sound = mixer.bank_mut().insert(wave.to_clip().unwrap());

    mixer.bank_mut().play(sound);
    assert!(mixer.bank().is_playing(sound));

    let mut peak = 0.0f32;
    let mut produced = 0;
    while mixer.bank().is_playing(sound) {
        let frame = mixer.next_frame();
        peak = peak.max(frame.left.abs());
        produced += 1;
        assert!(produced <= 2205, "voice ran past the end of the clip");
    }

    assert_eq!(produced, 2205);
    // The fixture sine peaks near half scale
    assert!(peak > 0.4, "expected audible output, peak was {}", peak);
}

#[test]
fn two_sounds_mix_additively() {
    let dir = tempfile::tempdir().unwrap();
    let path = helpers::write_sine_wav(&dir, "tone.wav", 1000, 44100, 2);

    let wave = Wave::load(&path).unwrap();

    let mut mixer = Mixer::new(44100);
    let a = mixer.bank_mut().insert(wave.to_clip().unwrap());
    let b = mixer.bank_mut().insert(wave.to_clip().unwrap());

    // Play the same content through one voice, then through two
    mixer.bank_mut().play(a);
    let mut solo = chime::AudioFrame::zero();
    for _ in 0..25 {
        solo = mixer.next_frame();
    }

    // play() on a playing sound restarts it from the top
    mixer.bank_mut().play(a);
    mixer.bank_mut().play(b);
    let mut duet = chime::AudioFrame::zero();
    for _ in 0..25 {
        duet = mixer.next_frame();
    }

    assert!(solo.left.abs() > 0.01, "fixture frame should be non-silent");
    assert!((duet.left - solo.left * 2.0).abs() < 1e-5);
}

#[test]
fn pause_resume_and_stop_transitions() {
    let dir = tempfile::tempdir().unwrap();
    let path = helpers::write_sine_wav(&dir, "tone.wav", 4410, 44100, 1);

    let mut mixer = Mixer::new(44100);
    let wave = Wave::load(&path).unwrap();
    let sound = mixer.bank_mut().insert(wave.to_clip().unwrap());

    assert_eq!(mixer.bank().state(sound), PlaybackState::Stopped);

    mixer.bank_mut().play(sound);
    for _ in 0..100 {
        mixer.next_frame();
    }

    mixer.bank_mut().pause(sound);
    assert_eq!(mixer.bank().state(sound), PlaybackState::Paused);

    mixer.bank_mut().resume(sound);
    assert_eq!(mixer.bank().state(sound), PlaybackState::Playing);

    mixer.bank_mut().stop(sound);
    assert_eq!(mixer.bank().state(sound), PlaybackState::Stopped);
}

#[test]
fn unload_invalidates_handle() {
    let dir = tempfile::tempdir().unwrap();
    let path = helpers::write_sine_wav(&dir, "tone.wav", 100, 44100, 1);

    let mut mixer = Mixer::new(44100);
    let wave = Wave::load(&path).unwrap();
    let sound = mixer.bank_mut().insert(wave.to_clip().unwrap());

    assert!(mixer.bank().contains(sound));
    assert!(mixer.bank_mut().remove(sound));
    assert!(!mixer.bank().contains(sound));

    // Every operation on the dead handle is a harmless no-op
    mixer.bank_mut().play(sound);
    mixer.bank_mut().set_volume(sound, 2.0);
    mixer.bank_mut().set_pitch(sound, 0.5);
    assert!(!mixer.bank().is_playing(sound));
    assert_eq!(mixer.next_frame().left, 0.0);
}

#[test]
fn invalid_handle_constant_is_never_valid() {
    let mixer = Mixer::new(44100);
    assert!(!mixer.bank().contains(Sound::INVALID));
    assert!(!mixer.bank().is_playing(Sound::INVALID));
}
