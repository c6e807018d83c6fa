use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use runny_remote::{
    ExecError, ExecOptions, ExitOutcome, OutputChunk, OutputSink, OutputStream, RemoteRunner, Script, ScriptedShell,
};
use tokio_util::sync::CancellationToken;

fn runner(script: Script, timeout: Option<Duration>) -> (Arc<ScriptedShell>, RemoteRunner) {
    let shell = Arc::new(ScriptedShell::new(script));
    let runner = RemoteRunner::new(shell.clone(), ExecOptions { timeout });
    (shell, runner)
}

fn recording_sink() -> (Arc<Mutex<Vec<OutputChunk>>>, Arc<dyn OutputSink>) {
    let chunks = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&chunks);
    let sink: Arc<dyn OutputSink> = Arc::new(move |chunk: OutputChunk| {
        recorded.lock().expect("chunks").push(chunk);
    });
    (chunks, sink)
}

#[tokio::test]
async fn run_once_combines_both_streams() {
    let script = Script::new()
        .stdout("one\n")
        .pause(Duration::from_millis(20))
        .stderr("warning\n")
        .pause(Duration::from_millis(20))
        .stdout("two\n");
    let (shell, runner) = runner(script, Some(Duration::from_secs(5)));

    let output = runner.run_once("ls /home", &CancellationToken::new()).await.expect("run");

    assert_eq!(String::from_utf8(output).expect("utf8"), "one\nwarning\ntwo\n");
    assert_eq!(shell.executed(), vec!["ls /home".to_string()]);
}

#[tokio::test]
async fn run_once_reports_nonzero_exit_with_output() {
    let (_shell, runner) = runner(Script::new().stderr("no such file\n").exit_code(2), None);

    let error = runner.run_once("ls /nope", &CancellationToken::new()).await.unwrap_err();

    match error {
        ExecError::ExitStatus { code, output } => {
            assert_eq!(code, 2);
            assert_eq!(output, b"no such file\n");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn missing_exit_status_is_an_error() {
    let (_shell, runner) = runner(Script::new().stdout("partial").exit(ExitOutcome::Missing), None);

    let error = runner.run_once("true", &CancellationToken::new()).await.unwrap_err();

    assert!(matches!(error, ExecError::MissingExitStatus { .. }));
}

#[tokio::test]
async fn transport_failures_surface_unchanged() {
    let (_shell, runner) = runner(Script::new().unreachable("connection refused"), None);

    let error = runner.run_once("true", &CancellationToken::new()).await.unwrap_err();

    assert_eq!(error.to_string(), "ssh transport error: connection refused");
}

#[tokio::test]
async fn streaming_collapses_carriage_returns_in_one_chunk() {
    let (_shell, runner) = runner(Script::new().stdout("progress: 10%\rprogress: 50%\rprogress: 100%"), None);
    let (chunks, sink) = recording_sink();

    runner.run_streaming("progress", sink, &CancellationToken::new()).await.expect("stream");

    let chunks = chunks.lock().expect("chunks");
    assert_eq!(
        *chunks,
        vec![OutputChunk {
            stream: OutputStream::Stdout,
            text: "progress: 100%".into(),
        }]
    );
}

#[tokio::test]
async fn streaming_resends_accumulated_text_per_stream() {
    let script = Script::new()
        .stdout("a\n")
        .pause(Duration::from_millis(20))
        .stderr("oops\n")
        .pause(Duration::from_millis(20))
        .stdout("b\n");
    let (_shell, runner) = runner(script, None);
    let (chunks, sink) = recording_sink();

    runner.run_streaming("run", sink, &CancellationToken::new()).await.expect("stream");

    let chunks = chunks.lock().expect("chunks");
    let stdout: Vec<_> = chunks
        .iter()
        .filter(|chunk| chunk.stream == OutputStream::Stdout)
        .map(|chunk| chunk.text.as_str())
        .collect();
    let stderr: Vec<_> = chunks
        .iter()
        .filter(|chunk| chunk.stream == OutputStream::Stderr)
        .map(|chunk| chunk.text.as_str())
        .collect();
    assert_eq!(stdout, vec!["a\n", "a\nb\n"]);
    assert_eq!(stderr, vec!["oops\n"]);
}

#[tokio::test]
async fn streaming_returns_exit_error_after_output() {
    let (_shell, runner) = runner(Script::new().stdout("half").exit_code(1), None);
    let (chunks, sink) = recording_sink();

    let error = runner.run_streaming("run", sink, &CancellationToken::new()).await.unwrap_err();

    assert!(matches!(error, ExecError::ExitStatus { code: 1, .. }));
    assert_eq!(chunks.lock().expect("chunks").len(), 1);
}

#[tokio::test(start_paused = true)]
async fn hung_command_times_out() {
    let script = Script::new().stdout("started\n").pause(Duration::from_secs(3600));
    let (_shell, runner) = runner(script, Some(Duration::from_secs(2)));

    let error = runner.run_once("sleep 3600", &CancellationToken::new()).await.unwrap_err();

    assert!(matches!(error, ExecError::TimedOut(timeout) if timeout == Duration::from_secs(2)));
}

#[tokio::test]
async fn cancellation_stops_streaming() {
    let script = Script::new().stdout("tick\n").pause(Duration::from_secs(3600));
    let (_shell, runner) = runner(script, None);
    let (chunks, sink) = recording_sink();
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });
    let error = runner.run_streaming("tail -f", sink, &cancel).await.unwrap_err();

    assert!(matches!(error, ExecError::Cancelled));
    assert_eq!(chunks.lock().expect("chunks").len(), 1);
}
