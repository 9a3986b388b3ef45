#![forbid(unsafe_code)]
use anyhow::{Context, Result};
use chrono::{DateTime, Local, TimeZone, Utc};
use clap::{Parser, Subcommand};
use shiftclock::{
    alarm::{next_trigger_with_holidays, parse_local_time, plan_alarms, TriggerSource},
    calendar::{render_month, CacheOptions, MonthCalendarCache},
    holiday::{HolidayProvider, HolidayTable},
    lunar::NoLunar,
    model::{parse_date, RotationConfig, RotationIdentity, Shift, YearMonth},
    overlay::apply_overlay,
    pattern,
    settings::{JsonSettingsStore, Settings, SettingsStore},
};
use std::fmt::Display;
use std::path::Path;
use std::sync::Arc;
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// CLI de calcul des postes et des réveils
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    /// Fichier JSON des réglages
    #[arg(long, global = true, default_value = "settings.json")]
    settings: String,

    /// Fichier JSON des jours fériés
    #[arg(long, global = true, default_value = "holidays.json")]
    holidays: String,

    /// Instant courant (RFC3339), horloge système par défaut
    #[arg(long, global = true)]
    now: Option<String>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Définir la rotation et la position dans le cycle
    SetRotation {
        /// long-day | four-three | four-two
        #[arg(long)]
        identity: String,
        /// YYYY-MM-DD
        #[arg(long)]
        base_date: String,
        #[arg(long, default_value_t = 0)]
        base_index: u32,
    },

    /// Définir l'heure d'alarme d'un poste
    SetAlarm {
        #[arg(long)]
        shift: String,
        /// HH:MM
        #[arg(long)]
        time: String,
    },

    /// Respecter (ou non) les jours fériés chômés
    HonorHolidays {
        #[arg(long, action = clap::ArgAction::Set)]
        enabled: bool,
    },

    /// Définir le fuseau horaire IANA
    SetTimezone {
        #[arg(long)]
        tz: String,
    },

    /// Importer des jours fériés depuis un CSV (`date,name,is_rest_day`)
    ImportHolidays {
        #[arg(long)]
        csv: String,
    },

    /// Poste d'une date
    Shift {
        /// YYYY-MM-DD
        #[arg(long)]
        date: String,
    },

    /// Calendrier d'un mois
    Month {
        #[arg(long)]
        year: i32,
        #[arg(long)]
        month: u32,
    },

    /// Prochain déclenchement d'alarme pour un poste
    NextAlarm {
        #[arg(long)]
        shift: String,
        /// HH:MM, heure des réglages par défaut
        #[arg(long)]
        time: Option<String>,
    },

    /// Prochain déclenchement de chaque poste
    Plan,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let store = JsonSettingsStore::open(&cli.settings);
    let mut settings = store.load_or_default()?;
    let holidays = load_holidays(&cli.holidays)?;

    let code = match cli.cmd {
        Commands::SetRotation {
            identity,
            base_date,
            base_index,
        } => {
            let identity: RotationIdentity = identity.parse()?;
            let base_date = parse_date(&base_date)?;
            settings.set_rotation(RotationConfig::new(identity, base_date, base_index));
            store.save(&settings)?;
            0
        }
        Commands::SetAlarm { shift, time } => {
            let shift: Shift = shift.parse()?;
            parse_local_time(&time)?;
            settings.alarm_times.insert(shift, time.trim().to_string());
            store.save(&settings)?;
            0
        }
        Commands::HonorHolidays { enabled } => {
            settings.honor_holidays = enabled;
            store.save(&settings)?;
            0
        }
        Commands::SetTimezone { tz } => {
            settings.timezone = Some(tz);
            settings.tz()?;
            store.save(&settings)?;
            0
        }
        Commands::ImportHolidays { csv } => {
            let count = holidays.import_csv(&csv)?;
            holidays.save_json(&cli.holidays)?;
            println!("{count} holiday(s) imported");
            0
        }
        Commands::Shift { date } => {
            let date = parse_date(&date)?;
            let config = settings.rotation_config();
            let shift = pattern::calculate(date, &config);
            let out = apply_overlay(shift, date, |d| holidays.lookup(d), settings.honor_holidays);
            match out.holiday_name {
                Some(name) => println!("{date} {} ({name})", out.shift),
                None => println!("{date} {}", out.shift),
            }
            0
        }
        Commands::Month { year, month } => {
            let ym = YearMonth::new(year, month)?;
            let cache = MonthCalendarCache::new(
                Arc::new(settings.clone()),
                Arc::new(holidays),
                Arc::new(NoLunar),
                CacheOptions {
                    prewarm: false,
                    ..CacheOptions::default()
                },
            );
            print!("{}", render_month(&cache.get(ym)));
            0
        }
        Commands::NextAlarm { shift, time } => match settings.tz()? {
            Some(tz) => {
                let now = current_time(cli.now.as_deref(), &tz)?;
                next_alarm(&settings, &holidays, &shift, time.as_deref(), &now)?
            }
            None => {
                let now = current_time(cli.now.as_deref(), &Local)?;
                next_alarm(&settings, &holidays, &shift, time.as_deref(), &now)?
            }
        },
        Commands::Plan => match settings.tz()? {
            Some(tz) => {
                let now = current_time(cli.now.as_deref(), &tz)?;
                print_plan(&settings, &holidays, &now)?
            }
            None => {
                let now = current_time(cli.now.as_deref(), &Local)?;
                print_plan(&settings, &holidays, &now)?
            }
        },
    };

    std::process::exit(code);
}

fn load_holidays(path: &str) -> Result<HolidayTable> {
    if Path::new(path).exists() {
        HolidayTable::load_json(path)
    } else {
        Ok(HolidayTable::new())
    }
}

fn current_time<Tz: TimeZone>(raw: Option<&str>, tz: &Tz) -> Result<DateTime<Tz>> {
    match raw {
        Some(raw) => Ok(DateTime::parse_from_rfc3339(raw)
            .with_context(|| format!("invalid --now: {raw}"))?
            .with_timezone(tz)),
        None => Ok(Utc::now().with_timezone(tz)),
    }
}

fn next_alarm<Tz>(
    settings: &Settings,
    holidays: &HolidayTable,
    shift: &str,
    time: Option<&str>,
    now: &DateTime<Tz>,
) -> Result<i32>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let shift: Shift = shift.parse()?;
    let time = match time {
        Some(t) => t.to_string(),
        None => settings
            .alarm_time(shift)
            .with_context(|| format!("no alarm time configured for {shift}"))?
            .to_string(),
    };
    let trigger = next_trigger_with_holidays(
        shift,
        &time,
        &settings.rotation_config(),
        holidays,
        settings.honor_holidays,
        now,
    )?;
    println!("{} {}", trigger.shift, trigger.at.to_rfc3339());
    // Code 2 = repli, jour non garanti
    Ok(match trigger.source {
        TriggerSource::Pattern => 0,
        TriggerSource::Fallback => {
            eprintln!("warning: no {shift} within the search horizon, using tomorrow");
            2
        }
    })
}

fn print_plan<Tz>(settings: &Settings, holidays: &HolidayTable, now: &DateTime<Tz>) -> Result<i32>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let plan = plan_alarms(settings, holidays, now)?;
    if plan.is_empty() {
        println!("no alarm configured");
    }
    for trigger in &plan {
        println!(
            "{} | {} | shift on {}",
            trigger.shift,
            trigger.at.to_rfc3339(),
            trigger.shift_date
        );
    }
    Ok(0)
}
