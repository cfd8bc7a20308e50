use super::*;

#[test]
fn no_command_runs_the_scheduler() {
    let cli = Cli::try_parse_from(["pulse"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
    assert!(!cli.skip_validation);
    assert!(cli.requires_credentials());
}

#[test]
fn parses_run_command() {
    let cli = Cli::try_parse_from(["pulse", "run"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Run)));
}

#[test]
fn parses_one_shot_commands() {
    let cli = Cli::try_parse_from(["pulse", "test"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Test)));

    let cli = Cli::try_parse_from(["pulse", "trends"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Trends)));

    let cli = Cli::try_parse_from(["pulse", "morning"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Morning)));

    let cli = Cli::try_parse_from(["pulse", "feedback"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Feedback)));

    let cli = Cli::try_parse_from(["pulse", "report"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Report)));
    assert!(cli.requires_credentials());
}

#[test]
fn generate_defaults_to_five_ideas() {
    let cli = Cli::try_parse_from(["pulse", "generate"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Generate { count: 5 })));
}

#[test]
fn generate_accepts_count() {
    let cli = Cli::try_parse_from(["pulse", "generate", "--count", "3"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Generate { count: 3 })));
}

#[test]
fn status_never_requires_credentials() {
    let cli = Cli::try_parse_from(["pulse", "status"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Status)));
    assert!(!cli.requires_credentials());
}

#[test]
fn skip_validation_is_global() {
    let before = Cli::try_parse_from(["pulse", "--skip-validation", "morning"]).unwrap();
    let after = Cli::try_parse_from(["pulse", "morning", "--skip-validation"]).unwrap();
    assert!(before.skip_validation && after.skip_validation);
    assert!(!before.requires_credentials());
}

#[test]
fn unknown_command_is_rejected() {
    assert!(Cli::try_parse_from(["pulse", "publish"]).is_err());
}
