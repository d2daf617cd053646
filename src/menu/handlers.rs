use crate::component::AnimatedThumbnailGenerator;
use crate::config::UserSettings;
use crate::pause;
use anyhow::Result;
use console::{Term, style};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

fn report_error(e: &anyhow::Error) {
    eprintln!("{} {:#}", style("錯誤:").red().bold(), e);
}

pub fn run_generate_thumbnail(
    term: &Term,
    shutdown_signal: &Arc<AtomicBool>,
    settings: &mut UserSettings,
) -> Result<()> {
    let generator = AnimatedThumbnailGenerator::new(Arc::clone(shutdown_signal));

    if let Err(e) = generator.run_single(settings) {
        report_error(&e);
    }

    pause(term)?;
    Ok(())
}

pub fn run_custom_thumbnail(
    term: &Term,
    shutdown_signal: &Arc<AtomicBool>,
    settings: &mut UserSettings,
) -> Result<()> {
    let generator = AnimatedThumbnailGenerator::new(Arc::clone(shutdown_signal));

    if let Err(e) = generator.run_custom(settings) {
        report_error(&e);
    }

    pause(term)?;
    Ok(())
}

pub fn run_quick_preview(
    term: &Term,
    shutdown_signal: &Arc<AtomicBool>,
    settings: &mut UserSettings,
) -> Result<()> {
    let generator = AnimatedThumbnailGenerator::new(Arc::clone(shutdown_signal));

    if let Err(e) = generator.run_quick_preview(settings) {
        report_error(&e);
    }

    pause(term)?;
    Ok(())
}

pub fn run_batch_process(
    term: &Term,
    shutdown_signal: &Arc<AtomicBool>,
    settings: &UserSettings,
) -> Result<()> {
    let generator = AnimatedThumbnailGenerator::new(Arc::clone(shutdown_signal));

    if let Err(e) = generator.run_batch(settings) {
        report_error(&e);
    }

    pause(term)?;
    Ok(())
}

pub fn run_video_info(
    term: &Term,
    shutdown_signal: &Arc<AtomicBool>,
    settings: &mut UserSettings,
) -> Result<()> {
    let generator = AnimatedThumbnailGenerator::new(Arc::clone(shutdown_signal));

    if let Err(e) = generator.show_video_info(settings) {
        report_error(&e);
    }

    pause(term)?;
    Ok(())
}
