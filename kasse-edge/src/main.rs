use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use kasse_edge::printing::{
    ContentType, PrintEvents, PrintExecutor, PrintReport, PrintService, PrintStore, PrintTrigger,
};
use kasse_edge::setup_environment;

#[derive(Parser, Debug)]
#[command(name = "kasse-print", author, version, about = "Restaurant printer pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a test page on one printer
    TestPage { printer_id: String },
    /// Print what an order trigger prints automatically
    Print {
        order_id: String,
        #[arg(long, value_enum, default_value = "placed")]
        trigger: TriggerArg,
    },
    /// Reprint an order's kitchen tickets or receipt
    Reprint {
        order_id: String,
        #[arg(long, value_enum, default_value = "kitchen")]
        content: ContentArg,
    },
    /// Show how an order's items are routed, without printing
    Route { order_id: String },
    /// Check whether a printer is reachable
    Check { printer_id: String },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TriggerArg {
    Placed,
    Paid,
}

impl From<TriggerArg> for PrintTrigger {
    fn from(arg: TriggerArg) -> Self {
        match arg {
            TriggerArg::Placed => PrintTrigger::Placed,
            TriggerArg::Paid => PrintTrigger::Paid,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ContentArg {
    Kitchen,
    Receipt,
}

impl From<ContentArg> for ContentType {
    fn from(arg: ContentArg) -> Self {
        match arg {
            ContentArg::Kitchen => ContentType::KitchenTicket,
            ContentArg::Receipt => ContentType::CustomerReceipt,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = setup_environment();

    let store: Arc<dyn PrintStore> = Arc::new(config.store());
    let renderer = config.renderer()?;
    let events = PrintEvents::default();
    let timeout = config.timeout();

    let service = PrintService::from_store(store.clone(), |setup| {
        Ok(PrintExecutor::new(setup, renderer, events.clone())?.with_timeout(timeout))
    })
    .await
    .with_context(|| format!("loading printer setup from {}", config.setup_file.display()))?;

    match cli.command {
        Command::TestPage { printer_id } => {
            let report = service.executor().print_test_page(&printer_id).await?;
            println!(
                "{} [{}]: {}",
                report.printer_id,
                report.section,
                report.outcome.describe()
            );
        }
        Command::Print { order_id, trigger } => {
            let report = service.handle(&order_id, trigger.into()).await?;
            print_report(&report);
        }
        Command::Reprint { order_id, content } => {
            let report = service.reprint(&order_id, content.into()).await?;
            print_report(&report);
        }
        Command::Route { order_id } => {
            let order = store.load_order(&order_id).await?;
            let setup = service.executor().snapshot();
            for section in service.executor().route(&order)? {
                let printer = setup
                    .printer_for_section(&section.section)
                    .map(|p| p.name.as_str())
                    .unwrap_or("-");
                println!("{} -> {}", section.section, printer);
                for item in &section.items {
                    println!("    {} x {} ({})", item.quantity, item.name, item.id);
                }
            }
        }
        Command::Check { printer_id } => {
            let setup = service.executor().snapshot();
            let printer = setup
                .printer(&printer_id)
                .with_context(|| format!("unknown printer '{}'", printer_id))?;
            let online = kasse_printer::probe(&printer.connection).await;
            if !online {
                anyhow::bail!("{} ({}) is offline", printer.name, printer.connection);
            }
            println!("{} ({}): online", printer.name, printer.connection);
        }
    }

    service.executor().events().close();
    Ok(())
}

fn print_report(report: &PrintReport) {
    if report.is_empty() {
        println!("{}: nothing to print", report.order_id);
        return;
    }
    for section in &report.sections {
        println!(
            "{} -> {} [{}]: {}",
            section.section,
            section.printer_id,
            section.content_type.as_str(),
            section.outcome.describe()
        );
    }
}
