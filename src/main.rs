use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sibyl::audio::{AudioCapture, AudioPlayback};
use sibyl::config::LlmProvider;
use sibyl::llm::{CompletionModel, Embedder};
use sibyl::{
    AnswerGenerator, Config, ContextBuilder, CompletionClient, EmbeddingClient,
    HeuristicTokenCounter, MemoryStore, Session, SttClient, TokenCounter, TtsClient, VoiceInput,
    VoiceOutput,
};

/// Sibyl - voice question-answering assistant with semantic memory
#[derive(Parser)]
#[command(name = "sibyl", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Ask a single question from the command line (no audio)
    Ask {
        /// Question text
        question: String,
    },
    /// Run one listen/answer cycle and exit
    Once,
    /// Print the stored memory log
    Memory,
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test TTS output
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,sibyl=info",
        1 => "info,sibyl=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load()?;

    if let Some(cmd) = cli.command {
        return match cmd {
            Command::Ask { question } => cmd_ask(&config, &question).await,
            Command::Once => cmd_once(&config).await,
            Command::Memory => cmd_memory(&config),
            Command::TestMic { duration } => test_mic(duration).await,
            Command::TestTts { text } => test_tts(&config, &text).await,
        };
    }

    tracing::info!(
        memory_log = %config.memory.log_path.display(),
        "starting sibyl"
    );

    let mut session = build_voice_session(&config)?;
    session.run().await?;

    Ok(())
}

/// Build a session without voice I/O (text-only entry points)
fn build_text_session(config: &Config) -> anyhow::Result<Session> {
    let openai_key = config.api_keys.openai.clone().unwrap_or_default();

    let embedder: Arc<dyn Embedder + Send + Sync> = match config.llm.provider {
        LlmProvider::OpenAi => Arc::new(EmbeddingClient::new(
            openai_key.clone(),
            config.llm.embedding_model.clone(),
        )?),
        LlmProvider::Azure => Arc::new(EmbeddingClient::azure(
            openai_key.clone(),
            require_api_base(config)?,
            config.llm.embedding_model.clone(),
            config.llm.api_version.clone(),
        )?),
    };

    let completion: Arc<dyn CompletionModel + Send + Sync> = match config.llm.provider {
        LlmProvider::OpenAi => Arc::new(CompletionClient::new(
            openai_key,
            config.llm.completion_model.clone(),
        )?),
        LlmProvider::Azure => Arc::new(CompletionClient::azure(
            openai_key,
            require_api_base(config)?,
            config.llm.completion_model.clone(),
            config.llm.api_version.clone(),
        )?),
    };

    let counter: Arc<dyn TokenCounter + Send + Sync> = Arc::new(HeuristicTokenCounter);
    let store = MemoryStore::load(config.memory.log_path.clone())?;

    let context = ContextBuilder::new(
        embedder,
        Arc::clone(&counter),
        config.memory.max_context_tokens,
    );
    let answerer = AnswerGenerator::new(
        completion,
        config.llm.prompt_guide.clone(),
        config.llm.answer_max_tokens,
    );

    Ok(Session::new(
        context,
        answerer,
        counter,
        store,
        config.memory.chunk_max_tokens,
    ))
}

/// Build a session with microphone input and speaker output attached
fn build_voice_session(config: &Config) -> anyhow::Result<Session> {
    let session = build_text_session(config)?;

    let input = VoiceInput::new(
        build_stt(config)?,
        Duration::from_secs(config.voice.listen_timeout_secs),
    )?;
    let output = VoiceOutput::new(build_tts(config)?)?;

    Ok(session.with_voice(Box::new(input), Box::new(output)))
}

/// STT provider resolution: Deepgram when its key is configured, Whisper
/// otherwise
fn build_stt(config: &Config) -> anyhow::Result<SttClient> {
    if let Some(key) = &config.api_keys.deepgram {
        Ok(SttClient::new_deepgram(
            key.clone(),
            config.voice.stt_model.clone(),
        )?)
    } else {
        Ok(SttClient::new_whisper(
            config.api_keys.openai.clone().unwrap_or_default(),
            config.voice.stt_model.clone(),
        )?)
    }
}

/// TTS provider resolution: ElevenLabs when its key is configured, OpenAI
/// otherwise
fn build_tts(config: &Config) -> anyhow::Result<TtsClient> {
    if let Some(key) = &config.api_keys.elevenlabs {
        Ok(TtsClient::new_elevenlabs(
            key.clone(),
            config.voice.tts_model.clone(),
            config.voice.tts_voice.clone(),
        )?)
    } else {
        Ok(TtsClient::new_openai(
            config.api_keys.openai.clone().unwrap_or_default(),
            config.voice.tts_model.clone(),
            config.voice.tts_voice.clone(),
            config.voice.tts_speed,
        )?)
    }
}

fn require_api_base(config: &Config) -> anyhow::Result<String> {
    config
        .llm
        .api_base
        .clone()
        .ok_or_else(|| anyhow::anyhow!("OPENAI_API_BASE required for the azure provider"))
}

/// Ask a single text question
#[allow(clippy::future_not_send)]
async fn cmd_ask(config: &Config, question: &str) -> anyhow::Result<()> {
    let mut session = build_text_session(config)?;

    let answer = session.ask(question).await?;
    if answer.is_empty() {
        println!("No answer produced. Check your API key and network.");
    } else {
        println!("{answer}");
    }

    Ok(())
}

/// Run a single voice cycle
#[allow(clippy::future_not_send)]
async fn cmd_once(config: &Config) -> anyhow::Result<()> {
    let mut session = build_voice_session(config)?;

    let outcome = session.run_cycle().await?;
    println!("Cycle finished: {outcome:?}");

    Ok(())
}

/// Print the stored memory log
fn cmd_memory(config: &Config) -> anyhow::Result<()> {
    let store = MemoryStore::load(config.memory.log_path.clone())?;

    if store.is_empty() {
        println!("Memory log is empty ({})", store.path().display());
        return Ok(());
    }

    for (i, record) in store.records().iter().enumerate() {
        println!("[{i}] {}", record.text);
    }

    Ok(())
}

/// Test microphone input
#[allow(clippy::future_not_send)]
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let mut capture = AudioCapture::new()?;
    capture.start()?;

    for i in 0..duration {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let samples = capture.take_buffer();
        let energy = calculate_rms(&samples);
        let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);

        // Visual meter
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let meter_len = (energy * 100.0).min(50.0) as usize;
        let meter: String = "█".repeat(meter_len) + &" ".repeat(50 - meter_len);

        println!(
            "[{:2}s] RMS: {:.4} | Peak: {:.4} | [{}]",
            i + 1,
            energy,
            peak,
            meter
        );
    }

    capture.stop();

    println!("\n---");
    println!("If you saw movement in the meter, your mic is working!");
    println!("If RMS stayed near 0, check your input device and levels.");

    Ok(())
}

/// Calculate RMS energy
#[allow(clippy::cast_precision_loss)]
fn calculate_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

/// Test TTS output
#[allow(clippy::future_not_send)]
async fn test_tts(config: &Config, text: &str) -> anyhow::Result<()> {
    println!("Testing TTS with text: \"{text}\"\n");

    let tts = build_tts(config)?;

    println!("Synthesizing speech...");
    let mp3_data = tts
        .synthesize(text)
        .await
        .map_err(|e| anyhow::anyhow!("TTS synthesis failed: {e}"))?;
    println!("Got {} bytes of audio data", mp3_data.len());

    println!("Playing audio...");
    let mut playback = AudioPlayback::new()?;
    playback.play_mp3(&mp3_data).await?;

    println!("\n---");
    println!("If you heard the speech, TTS is working!");

    Ok(())
}
