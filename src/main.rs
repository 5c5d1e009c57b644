use std::{process, sync::Arc};

use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;
use vitrine::{
    application::{
        editor::{ContentEditor, EditorConfig, EditorContext},
        error::{AppError, ErrorReport},
        gateway::PersistenceGateway,
    },
    cache::{CacheConfig, ChangeSignal, ContentCache},
    config::{self, Command, SetArgs, Settings, ShowArgs},
    domain::{
        content::ContentValue,
        schema::{FieldKind, SchemaRegistry},
        sections,
        validation::ValidationReport,
    },
    infra::{store::FileStore, telemetry},
    util::clock::{Clock, SystemClock},
};

fn main() {
    if let Err(error) = run() {
        report_application_error(&error);
        process::exit(i32::from(error.exit_code()));
    }
}

fn report_application_error(error: &AppError) {
    let report = ErrorReport::from_error("vitrine::main", error);
    if dispatcher::has_been_set() {
        error!(error = %report.summary(), source = report.source, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %report.summary(), source = report.source, "application error");
    });
}

fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;
    telemetry::init(&settings.logging)?;

    let registry = Arc::new(sections::builtin_registry()?);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let gateway = Arc::new(build_gateway(&settings, Arc::clone(&clock)));

    match cli_args.command.unwrap_or(Command::Sections) {
        Command::Sections => run_sections(&registry),
        Command::Show(args) => run_show(&registry, &gateway, &args),
        Command::Check => run_check(&registry, &gateway),
        Command::Set(args) => {
            let context = EditorContext::new(
                registry,
                gateway,
                clock,
                EditorConfig::from(&settings.editor),
            );
            run_set(context, &args)
        }
        Command::ClearDraft => {
            gateway.clear_draft()?;
            info!("Preview draft cleared");
            Ok(())
        }
    }
}

fn build_gateway(settings: &Settings, clock: Arc<dyn Clock>) -> PersistenceGateway {
    let store = FileStore::new(settings.storage.directory.clone());
    let cache = ContentCache::new(CacheConfig::from(&settings.storage), clock);
    PersistenceGateway::new(Arc::new(store), Arc::new(cache), Arc::new(ChangeSignal::new()))
}

fn run_sections(registry: &SchemaRegistry) -> Result<(), AppError> {
    for schema in registry.schemas() {
        println!(
            "{:<10} {:<12} {} fields in {} groups",
            schema.id,
            schema.title,
            schema.fields().count(),
            schema.groups.len()
        );
    }
    Ok(())
}

fn run_show(
    registry: &SchemaRegistry,
    gateway: &PersistenceGateway,
    args: &ShowArgs,
) -> Result<(), AppError> {
    registry.schema(&args.section)?;

    let stored = if args.draft {
        gateway
            .load_draft()
            .and_then(|draft| draft.section(&args.section).cloned())
    } else {
        gateway.load_section(&args.section)
    };
    let content = stored.unwrap_or_else(|| registry.default_content(&args.section));

    let rendered = serde_json::to_string_pretty(&content.to_json())
        .map_err(|err| AppError::unexpected(format!("failed to render content: {err}")))?;
    println!("{rendered}");
    Ok(())
}

fn run_check(registry: &SchemaRegistry, gateway: &PersistenceGateway) -> Result<(), AppError> {
    let mut invalid = Vec::new();

    for schema in registry.schemas() {
        let content = gateway
            .load_section(&schema.id)
            .unwrap_or_else(|| registry.default_content(&schema.id));
        let report = ValidationReport::for_content(schema, &content);
        if report.is_valid() {
            println!("{}: ok", schema.id);
            continue;
        }
        for (field, messages) in report.iter() {
            for message in messages {
                println!("{}.{field}: {message}", schema.id);
            }
        }
        invalid.push(schema.id.clone());
    }

    if invalid.is_empty() {
        Ok(())
    } else {
        Err(AppError::validation(format!(
            "sections with violations: {}",
            invalid.join(", ")
        )))
    }
}

fn run_set(context: EditorContext, args: &SetArgs) -> Result<(), AppError> {
    let mut editor = ContentEditor::open(context, &args.section)?;
    let field = editor.schema().require_field(&args.field)?.clone();
    let value = parse_value(field.kind, &args.value)?;

    for message in editor.update_field(&field.id, value)? {
        println!("{}: {message}", field.id);
    }
    editor.save()?;
    println!("{}.{} saved", args.section, field.id);
    Ok(())
}

fn parse_value(kind: FieldKind, raw: &str) -> Result<ContentValue, AppError> {
    match kind {
        FieldKind::Boolean => raw
            .trim()
            .parse::<bool>()
            .map(ContentValue::Bool)
            .map_err(|_| AppError::validation(format!("`{raw}` is not true or false"))),
        FieldKind::Numeric => Ok(raw
            .trim()
            .parse::<f64>()
            .map(ContentValue::number)
            .unwrap_or_else(|_| ContentValue::text(raw))),
        FieldKind::OrderedList => {
            let parsed: serde_json::Value = serde_json::from_str(raw).map_err(|err| {
                AppError::validation(format!("list values must be a JSON array: {err}"))
            })?;
            match ContentValue::from(parsed) {
                list @ ContentValue::List(_) => Ok(list),
                _ => Err(AppError::validation("list values must be a JSON array")),
            }
        }
        _ => Ok(ContentValue::text(raw)),
    }
}
