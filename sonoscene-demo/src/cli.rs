use crate::manifest::{Manifest, SceneSpec};
use anyhow::{Context, Result, anyhow, bail};
use crossbeam_channel::unbounded;
use sonoscene_core::audio_data::DEFAULT_TRIM_TOP_DB;
use sonoscene_core::config::RenderOptions;
use sonoscene_core::dataset::{SceneMetadata, save_scene, scene_dir};
use sonoscene_core::features::{FeatureInput, ReadOptions, TransformKind, extract_features};
use sonoscene_core::math::{azimuth, azimuth_bin};
use sonoscene_core::scene::{Scene, SoundSource};
use std::path::{Path, PathBuf};
use std::thread;

pub const USAGE: &str = "\
Usage:
  sonoscene-demo render <manifest.json> <output_dir> [--workers N]
  sonoscene-demo features <audio file> <mel|cqt> [--sample-rate HZ] [--trim] [--output FILE.json]";

/// Background workers used when `--workers` is not given
const DEFAULT_WORKERS: usize = 25;

/// Width of the direction classes logged for each source, in degrees
const DIRECTION_BIN_DEGREES: f64 = 30.0;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Render {
        manifest: PathBuf,
        output_dir: PathBuf,
        workers: usize,
    },
    Features {
        input: PathBuf,
        kind: FeatureKind,
        sample_rate: Option<u32>,
        trim: bool,
        output: Option<PathBuf>,
    },
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    Mel,
    Cqt,
}

pub fn parse_args(args: &[String]) -> Result<Command> {
    let Some((command, rest)) = args.split_first() else {
        return Ok(Command::Help);
    };

    let mut positional = Vec::new();
    let mut workers = DEFAULT_WORKERS;
    let mut sample_rate = None;
    let mut trim = false;
    let mut output = None;

    let mut iter = rest.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--workers" => {
                workers = flag_value(&mut iter, "--workers")?
                    .parse()
                    .context("--workers expects a number")?;
                if workers == 0 {
                    bail!("--workers must be at least 1");
                }
            }
            "--sample-rate" => {
                sample_rate = Some(
                    flag_value(&mut iter, "--sample-rate")?
                        .parse()
                        .context("--sample-rate expects a number of Hz")?,
                );
            }
            "--trim" => trim = true,
            "--output" => output = Some(PathBuf::from(flag_value(&mut iter, "--output")?)),
            flag if flag.starts_with("--") => bail!("unknown option {}", flag),
            value => positional.push(value),
        }
    }

    match (command.as_str(), positional.as_slice()) {
        ("help" | "--help" | "-h", _) => Ok(Command::Help),
        ("render", [manifest, output_dir]) => Ok(Command::Render {
            manifest: PathBuf::from(manifest),
            output_dir: PathBuf::from(output_dir),
            workers,
        }),
        ("features", [input, kind]) => {
            let kind = match *kind {
                "mel" => FeatureKind::Mel,
                "cqt" => FeatureKind::Cqt,
                other => bail!("unknown transform {}, expected mel or cqt", other),
            };
            Ok(Command::Features {
                input: PathBuf::from(input),
                kind,
                sample_rate,
                trim,
                output,
            })
        }
        ("render" | "features", _) => bail!("wrong number of arguments for {}", command),
        (other, _) => bail!("unknown command {}", other),
    }
}

fn flag_value<'a>(iter: &mut impl Iterator<Item = &'a String>, flag: &str) -> Result<&'a str> {
    iter.next()
        .map(String::as_str)
        .ok_or_else(|| anyhow!("{} needs a value", flag))
}

pub fn run(command: Command) -> Result<()> {
    match command {
        Command::Render {
            manifest,
            output_dir,
            workers,
        } => render_batch(&manifest, &output_dir, workers),
        Command::Features {
            input,
            kind,
            sample_rate,
            trim,
            output,
        } => dump_features(&input, kind, sample_rate, trim, output.as_deref()),
        Command::Help => Ok(()),
    }
}

/// Render every scene of a manifest into `output_dir/{index:05}` on a worker pool.
///
/// A failing scene is logged and skipped; the batch reports how many failed at the end.
fn render_batch(manifest_path: &Path, output_dir: &Path, workers: usize) -> Result<()> {
    let manifest = Manifest::load(manifest_path)?;
    let options = manifest.render_options();
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("creating {}", output_dir.display()))?;

    let workers = workers.min(manifest.scenes.len()).max(1);
    log::info!(
        "Rendering {} scene(s) of {:.2}s with {} worker(s) into {}",
        manifest.scenes.len(),
        manifest.scene_duration,
        workers,
        output_dir.display()
    );

    let (job_sender, job_receiver) = unbounded::<(usize, &SceneSpec)>();
    let (result_sender, result_receiver) = unbounded::<(usize, Result<()>)>();
    for job in manifest.scenes.iter().enumerate() {
        job_sender
            .send(job)
            .map_err(|_| anyhow!("scene queue closed early"))?;
    }
    drop(job_sender);

    thread::scope(|scope| {
        for _ in 0..workers {
            let jobs = job_receiver.clone();
            let results = result_sender.clone();
            let manifest = &manifest;
            let options = &options;
            scope.spawn(move || {
                for (index, spec) in jobs {
                    let outcome = render_one(index, spec, manifest, options, output_dir);
                    if results.send((index, outcome)).is_err() {
                        break;
                    }
                }
            });
        }
    });
    drop(result_sender);

    let mut failed = 0;
    for (index, outcome) in result_receiver {
        if let Err(e) = outcome {
            failed += 1;
            log::error!("Scene {:05} failed: {:#}", index, e);
        }
    }

    log::info!(
        "Finished: {} rendered, {} failed",
        manifest.scenes.len() - failed,
        failed
    );
    if failed > 0 {
        bail!("{} of {} scene(s) failed", failed, manifest.scenes.len());
    }
    Ok(())
}

/// Render one scene, then write it; nothing touches disk until the render succeeds.
fn render_one(
    index: usize,
    spec: &SceneSpec,
    manifest: &Manifest,
    options: &RenderOptions,
    output_dir: &Path,
) -> Result<()> {
    let dir = scene_dir(output_dir, index);

    let sources = spec
        .sources
        .iter()
        .map(|s| s.build())
        .collect::<Result<Vec<SoundSource>>>()?;

    let mut metadata = SceneMetadata::new();
    let mut dry = Vec::new();
    for (i, (source, source_spec)) in sources.iter().zip(&spec.sources).enumerate() {
        let filename = match source_spec.files.as_slice() {
            [single] => single.clone(),
            _ => {
                // Joined utterances have no file of their own yet
                let path = dir.join(format!("source{:02}_dry.wav", i));
                dry.push((source, path.clone()));
                path
            }
        };
        metadata.insert_source(i, source.position(), filename.display().to_string());

        let direction = azimuth(source.position());
        log::debug!(
            "Scene {:05} source {}: azimuth {:.1} deg, direction bin {}",
            index,
            i,
            direction.to_degrees(),
            azimuth_bin(direction, DIRECTION_BIN_DEGREES)?
        );
    }

    let mut mics = manifest.microphones();
    Scene::new(&sources, &mut mics)?.render(manifest.scene_duration, options)?;

    let written = save_scene(&dir, &mics, &metadata)
        .and_then(|()| dry.iter().try_for_each(|(source, path)| source.save(path)));
    if let Err(e) = written {
        if let Err(cleanup) = std::fs::remove_dir_all(&dir) {
            log::warn!("Could not remove partial scene {}: {}", dir.display(), cleanup);
        }
        return Err(e.into());
    }

    log::info!("Scene {:05} done ({} source(s))", index, sources.len());
    Ok(())
}

fn dump_features(
    input: &Path,
    kind: FeatureKind,
    sample_rate: Option<u32>,
    trim: bool,
    output: Option<&Path>,
) -> Result<()> {
    let transform = match kind {
        FeatureKind::Mel => TransformKind::mel(),
        FeatureKind::Cqt => TransformKind::cqt(),
    };
    let read = ReadOptions {
        trim_silence: trim.then_some(DEFAULT_TRIM_TOP_DB),
    };

    let features = extract_features(FeatureInput::Path(input), sample_rate, &transform, &read)
        .with_context(|| format!("extracting features from {}", input.display()))?;

    let (bins, frames) = features.dim();
    let min = features.iter().copied().fold(f32::INFINITY, f32::min);
    let max = features.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    println!(
        "{}: {} bins x {} frames, {:.1} dB .. {:.1} dB",
        input.display(),
        bins,
        frames,
        min,
        max
    );

    if let Some(path) = output {
        let rows: Vec<Vec<f32>> = features.rows().into_iter().map(|r| r.to_vec()).collect();
        let file = std::fs::File::create(path)
            .with_context(|| format!("creating {}", path.display()))?;
        serde_json::to_writer(std::io::BufWriter::new(file), &rows)?;
        log::info!("Wrote features to {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_render() {
        let command = parse_args(&args(&["render", "batch.json", "out", "--workers", "4"])).unwrap();
        assert_eq!(
            command,
            Command::Render {
                manifest: PathBuf::from("batch.json"),
                output_dir: PathBuf::from("out"),
                workers: 4,
            }
        );

        let default_workers = parse_args(&args(&["render", "batch.json", "out"])).unwrap();
        assert!(matches!(
            default_workers,
            Command::Render {
                workers: DEFAULT_WORKERS,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_features() {
        let command =
            parse_args(&args(&["features", "mix.wav", "cqt", "--trim", "--sample-rate", "16000"]))
                .unwrap();
        assert_eq!(
            command,
            Command::Features {
                input: PathBuf::from("mix.wav"),
                kind: FeatureKind::Cqt,
                sample_rate: Some(16000),
                trim: true,
                output: None,
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_args(&args(&["render", "only-one"])).is_err());
        assert!(parse_args(&args(&["features", "a.wav", "stft"])).is_err());
        assert!(parse_args(&args(&["render", "m.json", "out", "--workers"])).is_err());
        assert!(parse_args(&args(&["render", "m.json", "out", "--workers", "0"])).is_err());
        assert!(parse_args(&args(&["mix"])).is_err());
        assert_eq!(parse_args(&[]).unwrap(), Command::Help);
    }

    #[test]
    fn test_render_batch_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let clip = dir.path().join("tone.wav");
        let tone: Vec<f32> = (0..4800).map(|i| (i as f32 * 0.05).sin() * 0.5).collect();
        sonoscene_core::audio_data::write_wav(
            &clip,
            &tone,
            48000,
            1,
            sonoscene_core::WavEncoding::Float32,
        )
        .unwrap();

        let manifest = dir.path().join("batch.json");
        std::fs::write(
            &manifest,
            r#"{
                "scene_duration": 0.2,
                "mic_array": { "type": "circle", "num_mics": 2, "radius": 0.3 },
                "scenes": [
                    { "sources": [ { "position": [1.0, 1.0, 0.0], "files": ["tone.wav"] } ] },
                    { "sources": [ { "position": [0.0, -2.0, 0.0], "files": ["tone.wav", "tone.wav"] } ] },
                    { "sources": [ { "position": [3.0, 0.0, 0.0], "files": ["missing.wav"] } ] },
                    { "sources": [ { "position": [0.3, 0.0, 0.0], "files": ["tone.wav", "tone.wav"] } ] }
                ]
            }"#,
        )
        .unwrap();

        let out = dir.path().join("out");
        // Scene 2 has a missing file and scene 3 sits on microphone 0
        assert!(render_batch(&manifest, &out, 2).is_err());

        assert!(out.join("00000/mic00_mixed.wav").is_file());
        assert!(out.join("00000/mic01_source00_gt.wav").is_file());
        assert!(out.join("00000/metadata.json").is_file());
        assert!(out.join("00001/source00_dry.wav").is_file());
        assert!(out.join("00001/metadata.json").is_file());
        assert!(!out.join("00002").exists());
        assert!(!out.join("00003").exists());
    }
}
