mod gemini;

use clap::{Parser, Subcommand};
use gemini::GeminiBackend;
use pals_core::app::coerce_number;
use pals_core::checklist::ChecklistMode;
use pals_core::metronome::ToneKind;
use pals_core::theory::{self, ContentBlock, TheorySection};
use pals_core::timer::{format_clock, CyclePhase};
use pals_core::*;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "pals")]
#[command(about = "Pediatric advanced life support bedside reference", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Patient weight in kg
    #[arg(long, global = true, allow_negative_numbers = true)]
    weight: Option<f64>,

    /// Patient age in years (0.5 = six months)
    #[arg(long, global = true, allow_negative_numbers = true)]
    age: Option<f64>,

    /// Two or more rescuers (15:2)
    #[arg(long, global = true)]
    multi_rescuer: bool,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Quick stats card (default)
    Summary,

    /// Weight-based drug doses
    Doses {
        /// Only show drugs relevant to this decision step
        #[arg(long)]
        step: Option<String>,

        /// Ignore the step filter
        #[arg(long)]
        all: bool,

        /// Include indication, route and notes
        #[arg(long)]
        details: bool,
    },

    /// Equipment sizes
    Equipment,

    /// Physiological targets
    Targets,

    /// Walk a decision graph by option numbers
    Flow {
        /// cardiac-arrest, bradycardia or tachycardia
        #[arg(long)]
        algorithm: Option<String>,

        /// Comma-separated option numbers, e.g. 1,1,2
        #[arg(long)]
        path: Option<String>,
    },

    /// Resuscitation and post-ROSC checklists
    Checklist,

    /// Key-points library; lists sections without an argument
    Theory {
        section: Option<String>,
    },

    /// Run the resuscitation timer
    Timer {
        /// Start with the metronome on
        #[arg(long)]
        metronome: bool,

        /// No tone output
        #[arg(long)]
        silent: bool,

        /// Stop after this many seconds instead of waiting for Enter
        #[arg(long)]
        seconds: Option<u64>,
    },

    /// Ask the clinical assistant one question
    Ask {
        #[arg(required = true)]
        question: Vec<String>,
    },

    /// Interactive session reading commands from stdin
    Session,
}

fn main() -> Result<()> {
    pals_core::logging::init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let mut patient = config.patient();
    if let Some(weight) = cli.weight {
        patient.weight = weight;
    }
    if let Some(age) = cli.age {
        patient.age = age;
    }
    if cli.multi_rescuer {
        patient.is_multi_rescuer = true;
    }

    let library = get_default_library();
    let errors = library.validate();
    if !errors.is_empty() {
        eprintln!("Decision graph validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::Protocol("Invalid decision graphs".into()));
    }

    let mut app = AppState::new(patient);

    match cli.command {
        Some(Commands::Summary) | None => {
            render_summary(&app);
            Ok(())
        }
        Some(Commands::Doses { step, all, details }) => {
            if let Some(step) = step {
                app.decision.step_id = step;
            }
            if all {
                app.apply(Command::ToggleShowAll)?;
            }
            render_doses(&app, details);
            Ok(())
        }
        Some(Commands::Equipment) => {
            render_equipment(&app);
            Ok(())
        }
        Some(Commands::Targets) => {
            render_targets(&app);
            Ok(())
        }
        Some(Commands::Flow { algorithm, path }) => cmd_flow(&mut app, algorithm, path),
        Some(Commands::Checklist) => {
            render_checklist(&app, None);
            Ok(())
        }
        Some(Commands::Theory { section }) => cmd_theory(section.as_deref()),
        Some(Commands::Timer {
            metronome,
            silent,
            seconds,
        }) => cmd_timer(&config, metronome, silent, seconds),
        Some(Commands::Ask { question }) => cmd_ask(&app, &config, &question.join(" ")),
        Some(Commands::Session) => cmd_session(app, &config),
    }
}

// ============================================================================
// Commands
// ============================================================================

fn parse_path(path: &str) -> Result<Vec<usize>> {
    path.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| match s.parse::<usize>() {
            Ok(n) if n > 0 => Ok(n - 1),
            _ => Err(Error::Parse(format!("'{}' is not an option number", s))),
        })
        .collect()
}

fn cmd_flow(app: &mut AppState, algorithm: Option<String>, path: Option<String>) -> Result<()> {
    if let Some(algorithm) = algorithm {
        app.apply(Command::SwitchAlgorithm(algorithm.parse()?))?;
    }

    for index in parse_path(path.as_deref().unwrap_or(""))? {
        choose_and_report(app, index)?;
    }

    println!();
    render_step(app)
}

/// Follow one option, printing the transition taken
fn choose_and_report(app: &mut AppState, index: usize) -> Result<()> {
    let label = app
        .current_step()?
        .next_steps
        .get(index)
        .map(|t| (t.label.clone(), t.target.clone()));

    app.apply(Command::Choose(index))?;

    if let Some((label, target)) = label {
        match target {
            Target::ArrestRedirect => println!(
                "→ {}: pulse lost, switching to {}",
                label,
                AlgorithmType::CardiacArrest.label()
            ),
            Target::Step(id) => println!("→ {} ({})", label, id),
        }
    }
    Ok(())
}

fn cmd_theory(section: Option<&str>) -> Result<()> {
    match section {
        None => {
            println!("Key points:");
            for section in theory::sections() {
                println!("  {:<20} {} [{}]", section.id, section.title, section.tag);
            }
            println!();
            println!("{}", theory::DISCLAIMER);
            Ok(())
        }
        Some(id) => {
            let section = theory::find_section(id)
                .ok_or_else(|| Error::Parse(format!("unknown section '{}'", id)))?;
            render_section(section);
            Ok(())
        }
    }
}

fn build_live_timer(config: &Config, silent: bool) -> LiveTimer {
    let tone = if silent { ToneKind::Silent } else { config.timer.tone };
    LiveTimer::new(Metronome::new(tone.build()))
}

fn cmd_timer(config: &Config, metronome: bool, silent: bool, seconds: Option<u64>) -> Result<()> {
    let mut timer = build_live_timer(config, silent);
    if metronome || config.timer.metronome_on_start {
        timer.toggle_metronome()?;
    }
    timer.start()?;

    match seconds {
        Some(limit) => {
            let started = Instant::now();
            let mut last_shown = 0;
            while started.elapsed() < Duration::from_secs(limit) {
                std::thread::sleep(Duration::from_millis(100));
                let snapshot = timer.snapshot();
                if snapshot.total_seconds != last_shown {
                    last_shown = snapshot.total_seconds;
                    println!("{}", timer_status(&snapshot));
                }
            }
        }
        None => {
            println!("Timer running. Press Enter to stop.");
            let mut input = String::new();
            io::stdin().read_line(&mut input)?;
        }
    }

    timer.pause()?;
    let snapshot = timer.snapshot();
    println!(
        "Stopped at {} (cycle {})",
        format_clock(snapshot.total_seconds),
        format_clock(u64::from(snapshot.cycle_seconds))
    );
    Ok(())
}

fn cmd_ask(app: &AppState, config: &Config, question: &str) -> Result<()> {
    let backend = GeminiBackend::from_config(&config.assistant)?;
    let mut conversation = Conversation::new();
    match conversation.send(&backend, &app.patient, question) {
        Some(reply) => println!("{}", reply.content),
        None => println!("Nothing to ask."),
    }
    println!();
    println!("{}", assistant::AI_DISCLAIMER);
    Ok(())
}

// ============================================================================
// Interactive session
// ============================================================================

const SESSION_HELP: &str = "\
Commands:
  weight <kg> | age <years> | rescuers single|multi
  summary | doses | all | card <n> | equipment | targets
  algo <name> | step | next <n> (or just <n>)
  checklist [during|post] | check <id> | reset checklist
  theory [section]
  timer start|pause|reset|metronome|status
  ask <question>
  tab <name> | help | quit";

fn cmd_session(mut app: AppState, config: &Config) -> Result<()> {
    let backend = GeminiBackend::from_config(&config.assistant)?;
    let mut conversation = Conversation::new();
    let mut timer = build_live_timer(config, false);
    if config.timer.metronome_on_start {
        timer.toggle_metronome()?;
    }

    tracing::info!("Session {} started", conversation.id);
    println!("PALS session. Type 'help' for commands.");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else { break };
        let line = line?;
        let (word, rest) = match line.trim().split_once(char::is_whitespace) {
            Some((word, rest)) => (word.to_lowercase(), rest.trim()),
            None => (line.trim().to_lowercase(), ""),
        };

        if word == "quit" || word == "exit" {
            break;
        }

        let outcome = session_command(
            &mut app,
            &mut timer,
            &mut conversation,
            &backend,
            &word,
            rest,
        );
        if let Err(e) = outcome {
            println!("error: {}", e);
        }
    }

    timer.pause()?;
    println!("Session ended.");
    Ok(())
}

fn session_command(
    app: &mut AppState,
    timer: &mut LiveTimer,
    conversation: &mut Conversation,
    backend: &GeminiBackend,
    word: &str,
    rest: &str,
) -> Result<()> {
    match word {
        "" => {}
        "help" => println!("{}", SESSION_HELP),
        "weight" => {
            app.apply(Command::SetWeight(coerce_number(rest)))?;
            render_summary(app);
        }
        "age" => {
            app.apply(Command::SetAge(coerce_number(rest)))?;
            render_summary(app);
        }
        "rescuers" => {
            let multi = match rest.to_lowercase().as_str() {
                "multi" | "multiple" | "2" => true,
                "single" | "1" => false,
                other => return Err(Error::Parse(format!("rescuers: '{}'", other))),
            };
            app.apply(Command::SetMultiRescuer(multi))?;
            render_summary(app);
        }
        "tab" => {
            let tab: NavTab = rest.parse()?;
            app.apply(Command::SelectTab(tab))?;
            render_tab(app)?;
        }
        "summary" => render_summary(app),
        "doses" => render_doses(app, false),
        "all" => {
            app.apply(Command::ToggleShowAll)?;
            render_doses(app, false);
        }
        "card" => {
            let n = rest
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| Error::Parse(format!("card: '{}'", rest)))?;
            app.apply(Command::ToggleDrugCard(n - 1))?;
            render_doses(app, false);
        }
        "equipment" => render_equipment(app),
        "targets" => render_targets(app),
        "algo" | "algorithm" => {
            app.apply(Command::SwitchAlgorithm(rest.parse()?))?;
            render_step(app)?;
        }
        "step" | "flow" => render_step(app)?,
        "next" => {
            let n = rest
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| Error::Parse(format!("next: '{}'", rest)))?;
            choose_and_report(app, n - 1)?;
            render_step(app)?;
        }
        "checklist" => {
            match rest.to_lowercase().as_str() {
                "" => {}
                "during" => app.apply(Command::SetChecklistMode(ChecklistMode::During))?,
                "post" => app.apply(Command::SetChecklistMode(ChecklistMode::Post))?,
                other => return Err(Error::Parse(format!("checklist: '{}'", other))),
            }
            render_checklist(app, Some(app.checklist.mode));
        }
        "check" => {
            app.apply(Command::ToggleChecklistItem(rest.to_string()))?;
            render_checklist(app, Some(app.checklist.mode));
        }
        "reset" if rest == "checklist" => {
            app.apply(Command::ResetChecklist)?;
            render_checklist(app, Some(app.checklist.mode));
        }
        "theory" => {
            if rest.is_empty() {
                cmd_theory(None)?;
            } else {
                app.apply(Command::ToggleTheorySection(rest.to_string()))?;
                match app.theory.open_section() {
                    Some(section) => render_section(section),
                    None => println!("(section closed)"),
                }
            }
        }
        "timer" => {
            match rest {
                "start" => timer.start()?,
                "pause" | "stop" => timer.pause()?,
                "reset" => timer.reset()?,
                "metronome" => {
                    timer.toggle_metronome()?;
                }
                "" | "status" => {}
                other => return Err(Error::Parse(format!("timer: '{}'", other))),
            }
            println!("{}", timer_status(&timer.snapshot()));
        }
        "ask" => match conversation.send(backend, &app.patient, rest) {
            Some(reply) => println!("{}", reply.content),
            None => println!("Nothing to ask."),
        },
        other => {
            // A bare number picks that option
            match other.parse::<usize>() {
                Ok(n) if n > 0 => {
                    choose_and_report(app, n - 1)?;
                    render_step(app)?;
                }
                _ => return Err(Error::Parse(format!("unknown command '{}'", other))),
            }
        }
    }
    Ok(())
}

// ============================================================================
// Rendering
// ============================================================================

fn render_summary(app: &AppState) {
    let p = &app.patient;
    let stats = app.quick_stats();

    println!("╭─────────────────────────────────────────╮");
    println!(
        "│  Patient: {} kg, {} y, {}",
        physio::display_number(p.weight),
        physio::display_number(p.age),
        if p.is_multi_rescuer {
            "2+ rescuers"
        } else {
            "1 rescuer"
        }
    );
    println!("╰─────────────────────────────────────────╯");
    println!("  Compression ratio   {}", stats.ratio);
    println!("  AED pads            {}", stats.aed_pads.label());
    println!("  Ventilation         {}", stats.ventilation);
    println!("  Saline bolus        {}", stats.saline);
    println!("  Epinephrine IV/IO   {}  (1:10,000)", stats.epi_iv);
    println!("  Epinephrine ET      {}  (1:10,000)", stats.epi_et);
}

fn render_doses(app: &AppState, details: bool) {
    let all = app.drugs();
    let visible = app.visible_drugs();

    println!(
        "Doses for {} kg",
        physio::display_number(app.patient.weight)
    );
    if app.drugs_filtered() {
        println!(
            "  Showing drugs for step {} ({} of {}); use 'all' to show every drug",
            app.decision.step_id,
            visible.len(),
            all.len()
        );
    }
    if visible.is_empty() {
        println!("  No drugs tagged for this step.");
    }

    for drug in &visible {
        let number = all.iter().position(|d| d.name == drug.name).unwrap_or(0);
        println!();
        println!("  [{}] {}", number + 1, drug.name);
        println!("      Dose: {}", drug.dose);
        println!("      {}", drug.note);
        if let Some(max) = &drug.max {
            println!("      Max: {}", max);
        }
        if details || app.calculator.expanded == Some(number) {
            println!("      Indication: {}", drug.details.indication);
            println!("      Route: {}", drug.details.route);
            println!("      Note: {}", drug.details.info);
        }
    }
}

fn render_equipment(app: &AppState) {
    println!(
        "Equipment for {} y / {} kg",
        physio::display_number(app.patient.age),
        physio::display_number(app.patient.weight)
    );
    for item in app.equipment() {
        match &item.note {
            Some(note) => println!("  {:<22} {:<24} {}", item.name, item.size, note),
            None => println!("  {:<22} {}", item.name, item.size),
        }
    }
}

fn render_targets(app: &AppState) {
    let t = app.targets();
    println!("Targets for age {} y", physio::display_number(app.patient.age));
    println!(
        "  Heart rate (awake)      {} /min  [{}]",
        t.heart_rate.range(),
        t.heart_rate.label
    );
    println!("  Minimum SBP             {}  ({})", t.min_sbp, t.sbp_formula);
    println!("  CPR diastolic           {}", t.min_cpr_dbp);
    println!("  Fluid bolus (20 ml/kg)  {}", t.bolus);
    println!("  SpO2                    {}", t.spo2);
    println!("  EtCO2 during CPR        {}", t.cpr_etco2);
    println!("  PaCO2                   {}", t.paco2);
    println!("  TTM                     {}", t.ttm);
    println!("  Glucose                 {}", t.glucose);
    println!("  Compression rate        {}", t.compression_rate);
    println!("  Compression depth       {}", t.compression_depth);
    println!("  Advanced airway breaths {}", t.advanced_airway_ventilation);
}

fn render_step(app: &AppState) -> Result<()> {
    let step = app.current_step()?;
    let prompts = app.prompts()?;

    println!("── {} ─ {}", app.decision.algorithm.label(), step.id);
    println!("{}", step.title);
    println!("  {}", step.description);

    if prompts.cycle_banners {
        println!("  ⟳ Analyse rhythm every 2 minutes");
        println!("  ⟳ Epinephrine every 3-5 minutes");
    }

    println!();
    for action in &step.actions {
        println!("  • {}", action);
    }

    if prompts.cpr_quality {
        println!();
        println!("  High-quality CPR: 100-120/min, depth ≥ 1/3 AP diameter,");
        println!("  full recoil, minimal pauses, no over-ventilation");
    }

    if prompts.reversible_causes {
        println!();
        println!("  Reversible causes (H's & T's):");
        for cause in theory::REVERSIBLE_CAUSES.iter() {
            println!("    {:<28} {}", cause.name, cause.action);
        }
    }

    if prompts.rosc_targets {
        let t = app.targets();
        println!();
        println!("  Post-ROSC targets:");
        println!("    SpO2 {}", t.spo2);
        println!("    SBP {}", t.min_sbp);
        println!("    TTM {}", t.ttm);
        println!("    EEG monitoring within 24 h");
    }

    if !step.next_steps.is_empty() {
        println!();
        for (i, transition) in step.next_steps.iter().enumerate() {
            println!(
                "  [{}] {} → {}",
                i + 1,
                transition.label,
                transition.target.as_str()
            );
        }
    }
    Ok(())
}

fn render_checklist(app: &AppState, only: Option<ChecklistMode>) {
    let modes = match only {
        Some(mode) => vec![mode],
        None => vec![ChecklistMode::During, ChecklistMode::Post],
    };

    for mode in modes {
        let (done, total) = app.checklist.progress(mode);
        println!("{} ({}/{})", mode.label(), done, total);
        for item in app.checklist.items(mode) {
            let mark = if item.checked { "x" } else { " " };
            println!("  [{}] {:<3} {}", mark, item.id, item.text);
        }
    }
}

fn render_section(section: &TheorySection) {
    println!("{} [{}]", section.title, section.tag);
    for block in &section.blocks {
        match block {
            ContentBlock::Heading(text) => {
                println!();
                println!("  {}", text);
            }
            ContentBlock::Paragraph(text) => println!("    {}", text),
            ContentBlock::Bullets(items) => {
                for item in items {
                    println!("    • {}", item);
                }
            }
            ContentBlock::KeyValue(rows) => {
                for (key, value) in rows {
                    println!("    {}: {}", key, value);
                }
            }
            ContentBlock::Table { header, rows } => {
                println!("    {}", header.join(" | "));
                for row in rows {
                    println!("    {}", row.join(" | "));
                }
            }
        }
    }
}

fn render_tab(app: &AppState) -> Result<()> {
    match app.tab {
        NavTab::Decision => render_step(app)?,
        NavTab::Targets => render_targets(app),
        NavTab::Calculator => {
            render_equipment(app);
            println!();
            render_doses(app, false);
        }
        NavTab::Checklist => render_checklist(app, Some(app.checklist.mode)),
        NavTab::Theory => match app.theory.open_section() {
            Some(section) => render_section(section),
            None => cmd_theory(None)?,
        },
        NavTab::Assistant => println!("Use 'ask <question>'."),
    }
    Ok(())
}

fn timer_status(timer: &SessionTimer) -> String {
    let phase = match timer.phase() {
        CyclePhase::Compressions => "",
        CyclePhase::Warning => "  rhythm check approaching",
        CyclePhase::CheckRhythm => "  CHECK RHYTHM AND PULSE NOW",
    };
    format!(
        "{} total {}  cycle {}  metronome {}{}",
        if timer.running { "▶" } else { "⏸" },
        format_clock(timer.total_seconds),
        format_clock(u64::from(timer.cycle_seconds)),
        if timer.metronome_on { "on" } else { "off" },
        phase
    )
}
