use sonoscene_core::audio_data::{AudioData, WavEncoding};
use sonoscene_core::config::RenderOptions;
use sonoscene_core::dataset::{SceneMetadata, mic_prefix, save_scene, scene_dir};
use sonoscene_core::features::{
    CqtConfig, FeatureInput, MelConfig, ReadOptions, TransformKind, dominance_masks,
    extract_features,
};
use sonoscene_core::math::DVec3;
use sonoscene_core::scene::{AudioInput, Microphone, Scene, SoundSource, SourceOptions};
use std::path::Path;
use std::time::Duration;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn sine(freq: f32, sample_rate: u32, seconds: f32) -> Vec<f32> {
    let len = (sample_rate as f32 * seconds) as usize;
    (0..len)
        .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin() * 0.5)
        .collect()
}

fn write_clip(path: &Path, samples: &[f32], sample_rate: u32) {
    AudioData::from_samples(samples.to_vec(), sample_rate, 1)
        .unwrap()
        .save_wav(path, WavEncoding::Float32)
        .unwrap();
}

#[test]
fn rendered_scene_survives_save_and_reload() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();

    let voice = dir.path().join("voice.wav");
    let hum = dir.path().join("hum.wav");
    write_clip(&voice, &sine(440.0, 48000, 0.5), 48000);
    write_clip(&hum, &sine(120.0, 48000, 1.0), 48000);

    let sources = vec![
        SoundSource::new(&[1.5, 0.5, 0.0], AudioInput::file(&voice), &SourceOptions::default())
            .unwrap(),
        SoundSource::new(
            &[-2.0, 3.0, 0.0],
            AudioInput::file(&hum),
            &SourceOptions::new().start_time(0.1),
        )
        .unwrap()
        .with_gain(0.5),
    ];
    let mut mics = Microphone::circular_array(4, 0.3);
    Scene::new(&sources, &mut mics)
        .unwrap()
        .render(0.75, &RenderOptions::default())
        .unwrap();

    let mut metadata = SceneMetadata::new();
    for (i, source) in sources.iter().enumerate() {
        metadata.insert_source(i, source.position(), format!("clip{}.wav", i));
    }

    let scene = scene_dir(dir.path(), 0);
    save_scene(&scene, &mics, &metadata).unwrap();

    for (i, mic) in mics.iter().enumerate() {
        let prefix = mic_prefix(&scene, i).display().to_string();
        let mixed = AudioData::from_path(format!("{}mixed.wav", prefix)).unwrap();
        assert_eq!(mixed.sample_rate(), 48000);
        assert_eq!(mixed.samples(), mic.buffer());

        for (s, gt) in mic.sources_gt().iter().enumerate() {
            let stem = AudioData::from_path(format!("{}source{:02}_gt.wav", prefix, s)).unwrap();
            assert_eq!(stem.samples(), gt.as_slice());
        }
    }

    let reloaded = SceneMetadata::load(scene.join("metadata.json")).unwrap();
    assert_eq!(reloaded, metadata);
    assert_eq!(reloaded.source(1).unwrap().position, [-2.0, 3.0, 0.0]);
}

#[test]
fn multi_file_source_with_offset_and_duration() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.wav");
    let b = dir.path().join("b.wav");
    write_clip(&a, &vec![0.25; 4800], 48000);
    write_clip(&b, &vec![-0.25; 4800], 48000);

    // Skip 10 ms and keep 50 ms of each file
    let options = SourceOptions::new()
        .offset(Duration::from_millis(10))
        .duration(Duration::from_millis(50));
    let source =
        SoundSource::new(&[0.0, 1.0, 0.0], AudioInput::files([&a, &b]), &options).unwrap();

    assert_eq!(source.samples().len(), 4800);
    assert!(source.samples()[..2400].iter().all(|&s| s == 0.25));
    assert!(source.samples()[2400..].iter().all(|&s| s == -0.25));
}

#[test]
fn sources_are_resampled_to_target_rate() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let clip = dir.path().join("lowrate.wav");
    write_clip(&clip, &sine(300.0, 16000, 0.5), 16000);

    let source =
        SoundSource::new(&[1.0, 0.0, 0.0], AudioInput::file(&clip), &SourceOptions::default())
            .unwrap();
    assert_eq!(source.sample_rate(), 48000);
    assert_eq!(source.samples().len(), 24000);
}

#[test]
fn features_of_rendered_microphones() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();

    let sources = vec![
        SoundSource::from_audio(
            DVec3::new(2.0, 0.0, 0.0),
            AudioData::from_samples(sine(1000.0, 48000, 1.0), 48000, 1).unwrap(),
            0.0,
        )
        .unwrap(),
        SoundSource::from_audio(
            DVec3::new(-2.0, 0.0, 0.0),
            AudioData::from_samples(sine(3000.0, 48000, 1.0), 48000, 1).unwrap(),
            0.0,
        )
        .unwrap(),
    ];
    let mut mics = vec![Microphone::at(DVec3::new(0.5, 0.0, 0.0))];
    Scene::new(&sources, &mut mics)
        .unwrap()
        .render(0.5, &RenderOptions::default())
        .unwrap();
    mics[0].save(dir.path().join("mic00_")).unwrap();

    let mel = extract_features(
        FeatureInput::Path(&dir.path().join("mic00_mixed.wav")),
        None,
        &TransformKind::Mel(MelConfig {
            hop_length: 512,
            ..Default::default()
        }),
        &ReadOptions::default(),
    )
    .unwrap();
    assert_eq!(mel.dim(), (128, 1 + 24000 / 512));

    let cqt_kind = TransformKind::Cqt(CqtConfig::default());
    let stems: Vec<_> = mics[0]
        .sources_gt()
        .iter()
        .map(|gt| {
            extract_features(
                FeatureInput::Samples(gt),
                Some(48000),
                &cqt_kind,
                &ReadOptions::default(),
            )
            .unwrap()
        })
        .collect();
    assert_eq!(stems[0].dim(), (256, 1 + 24000 / 256));

    let masks = dominance_masks(&stems).unwrap();
    assert_eq!(masks.dim(), (2, 256, stems[0].ncols()));
    // At most one source owns any cell
    for f in 0..256 {
        for t in 0..stems[0].ncols() {
            assert!(masks[[0, f, t]] + masks[[1, f, t]] <= 1.0);
        }
    }
}
