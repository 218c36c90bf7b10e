use std::ops::ControlFlow;
use std::path::Path;

use anyhow::{Context as _, anyhow, bail};
use serde::Serialize;
use tokio::sync::mpsc;

use super::Context;
use super::render;
use crate::domain::models::{Image, StatusFilter, Transformation, UpdateImageRequest};
use crate::domain::services::ImageService;
use crate::infrastructure::api::{StreamScope, Subscription};
use crate::shared::state::{
    AnnouncementFeed, CreateImageForm, DetailState, GalleryState, TransformationDraft,
};

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub async fn handle_list(
    ctx: &Context,
    page: u32,
    limit: u32,
    status: StatusFilter,
    search: Option<String>,
) -> anyhow::Result<()> {
    let mut gallery = GalleryState::new(limit);
    gallery.page = page;
    gallery.status_filter = status;
    gallery.search_query = search.unwrap_or_default();
    gallery.load(&ctx.api).await?;

    if ctx.json {
        return print_json(&serde_json::json!({
            "page": gallery.page,
            "limit": gallery.limit,
            "count": gallery.total_count,
            "total_pages": gallery.total_pages(),
            "data": gallery.visible_images(),
        }));
    }
    print!("{}", render::gallery(&gallery));
    Ok(())
}

pub async fn handle_get(ctx: &Context, id: &str) -> anyhow::Result<()> {
    let mut detail = DetailState::new(id);
    detail.load(&ctx.api).await?;

    if ctx.json {
        return print_json(&serde_json::json!({
            "image": detail.image,
            "metadata": detail.metadata,
            "original_url": detail.original_url(&ctx.storage),
            "transformed_url": detail.transformed_url(&ctx.storage),
        }));
    }
    print!("{}", render::detail(&detail, &ctx.storage));
    Ok(())
}

pub async fn handle_metadata(ctx: &Context, id: &str) -> anyhow::Result<()> {
    let metadata = ctx.api.get_image_metadata(id).await?;
    if ctx.json {
        return print_json(&metadata);
    }
    print!("{}", render::metadata(&metadata, &ctx.storage));
    Ok(())
}

pub async fn handle_create(
    ctx: &Context,
    url: String,
    transformations: Vec<Transformation>,
    follow: bool,
) -> anyhow::Result<()> {
    let mut form = CreateImageForm {
        image_url: url,
        draft: TransformationDraft::from_transformations(&transformations),
    };
    let id = form.submit(&ctx.api).await?;

    if ctx.json && !follow {
        return print_json(&serde_json::json!({ "id": id }));
    }
    println!("{}", id);

    if follow {
        follow_until_done(ctx, &id).await?;
    }
    Ok(())
}

/// Stream one image's updates until it reaches a terminal status.
async fn follow_until_done(ctx: &Context, id: &str) -> anyhow::Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut subscription = ctx.api.stream_image(id, move |image| {
        let _ = tx.send(image);
    })?;

    let outcome = follow_subscription(ctx, id, &mut subscription, &mut rx).await;
    subscription.close().await;

    let image = match outcome? {
        UpdatesEnd::Stopped(image) => image,
        UpdatesEnd::Interrupted => return Ok(()),
        UpdatesEnd::Disconnected => {
            // the stream ended first; the record tells whether processing did
            let image = ctx.api.get_image(id).await?;
            print_update(ctx, &image)?;
            if !image.status.is_terminal() {
                bail!(
                    "Live updates ended before {} finished processing (status: {})",
                    image.id,
                    image.status
                );
            }
            image
        }
    };
    finish_follow(&image)
}

async fn follow_subscription(
    ctx: &Context,
    id: &str,
    subscription: &mut Subscription,
    rx: &mut mpsc::UnboundedReceiver<Image>,
) -> anyhow::Result<UpdatesEnd> {
    // The image may have finished before the stream opened.
    let current = ctx.api.get_image(id).await?;
    print_update(ctx, &current)?;
    if current.status.is_terminal() {
        return Ok(UpdatesEnd::Stopped(current));
    }

    let mut detail = DetailState::new(id);
    detail.apply_update(current);
    pump_updates(subscription, rx, interrupted(), |image| {
        if !detail.apply_update(image.clone()) {
            return Ok(ControlFlow::Continue(()));
        }
        print_update(ctx, &image)?;
        if image.status.is_terminal() {
            return Ok(ControlFlow::Break(image));
        }
        Ok(ControlFlow::Continue(()))
    })
    .await
}

fn finish_follow(image: &Image) -> anyhow::Result<()> {
    if image.status.is_done() {
        return Ok(());
    }
    Err(anyhow!(
        "Processing of {} failed: {}",
        image.id,
        image.error_message.as_deref().unwrap_or("no reason given")
    ))
}

fn print_update(ctx: &Context, image: &Image) -> anyhow::Result<()> {
    if ctx.json {
        println!("{}", serde_json::to_string(image)?);
    } else {
        println!("{}", render::update_line(image));
    }
    Ok(())
}

pub async fn handle_update(
    ctx: &Context,
    id: &str,
    transformations: Vec<Transformation>,
) -> anyhow::Result<()> {
    let response = ctx
        .api
        .update_image(&UpdateImageRequest::new(id, transformations))
        .await?;
    if ctx.json {
        return print_json(&response);
    }
    println!("{}", response.message);
    Ok(())
}

pub async fn handle_delete(ctx: &Context, id: &str, confirmed: bool) -> anyhow::Result<()> {
    if !confirmed {
        bail!("Refusing to delete {} without --yes", id);
    }
    let response = ctx.api.delete_image(id).await?;
    if ctx.json {
        return print_json(&response);
    }
    println!("{}", response.message);
    Ok(())
}

/// How a live-update loop ended
#[derive(Debug, Clone, PartialEq)]
pub enum UpdatesEnd {
    /// The shutdown signal fired
    Interrupted,
    /// The server ended the stream; every delivered update was handled
    Disconnected,
    /// The update handler asked to stop on this image
    Stopped(Image),
}

/// Hand every update delivered to `rx` to `on_image` until it breaks, the
/// stream ends, or `shutdown` resolves.
///
/// Queued updates are always handled before a disconnect is reported: the
/// bridge has dropped its sender by the time `disconnected` resolves, so
/// whatever it delivered is already in the channel.
pub async fn pump_updates<S, F>(
    subscription: &mut Subscription,
    rx: &mut mpsc::UnboundedReceiver<Image>,
    shutdown: S,
    mut on_image: F,
) -> anyhow::Result<UpdatesEnd>
where
    S: Future<Output = ()>,
    F: FnMut(Image) -> anyhow::Result<ControlFlow<Image>>,
{
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => return Ok(UpdatesEnd::Interrupted),
            Some(image) = rx.recv() => {
                if let ControlFlow::Break(image) = on_image(image)? {
                    return Ok(UpdatesEnd::Stopped(image));
                }
            }
            result = subscription.disconnected() => {
                while let Ok(image) = rx.try_recv() {
                    if let ControlFlow::Break(image) = on_image(image)? {
                        return Ok(UpdatesEnd::Stopped(image));
                    }
                }
                result.context("Live updates disconnected")?;
                return Ok(UpdatesEnd::Disconnected);
            }
        }
    }
}

/// Resolves on Ctrl-C; never, if the handler cannot be installed.
async fn interrupted() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Print pushed updates until Ctrl-C or until the server ends the stream.
pub async fn handle_watch(ctx: &Context, id: Option<String>) -> anyhow::Result<()> {
    let scope = match id {
        Some(id) => StreamScope::Image(id),
        None => StreamScope::All,
    };

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut subscription = ctx.api.subscribe(scope.clone(), move |image| {
        let _ = tx.send(image);
    })?;
    tracing::info!(scope = %scope.label(), "Watching for updates, press Ctrl-C to stop");

    let outcome = match &scope {
        StreamScope::All => {
            let mut feed = AnnouncementFeed::new();
            pump_updates(&mut subscription, &mut rx, interrupted(), |image| {
                if ctx.json {
                    println!("{}", serde_json::to_string(&image)?);
                    return Ok(ControlFlow::Continue(()));
                }
                feed.push(image);
                if let Some(message) = feed.message() {
                    println!("{}", message);
                }
                Ok(ControlFlow::Continue(()))
            })
            .await
        }
        StreamScope::Image(id) => {
            let mut detail = DetailState::new(id.as_str());
            pump_updates(&mut subscription, &mut rx, interrupted(), |image| {
                if detail.apply_update(image.clone()) {
                    print_update(ctx, &image)?;
                }
                Ok(ControlFlow::Continue(()))
            })
            .await
        }
    };

    let stats = subscription.close().await;
    tracing::info!(
        delivered = stats.delivered,
        skipped = stats.skipped,
        "Stopped watching"
    );
    outcome.map(|_| ())
}

pub fn handle_url(ctx: &Context, key: &str) -> anyhow::Result<()> {
    let url = ctx.storage.object_url(key)?;
    println!("{}", url);
    Ok(())
}

pub async fn handle_download(
    ctx: &Context,
    id: &str,
    original: bool,
    output: &Path,
) -> anyhow::Result<()> {
    let image = ctx.api.get_image(id).await?;
    let key = if original {
        image.object_storage_image_key.as_str()
    } else {
        image.transformed_image_key.as_deref().ok_or_else(|| {
            anyhow!(
                "Image {} has no transformed output yet (status: {})",
                image.id,
                image.status
            )
        })?
    };

    let bytes = ctx.storage.fetch(key).await?;
    tokio::fs::write(output, &bytes)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;

    tracing::info!(image_id = %image.id, key = %key, bytes = bytes.len(), "Saved object");
    if ctx.json {
        return print_json(&serde_json::json!({
            "id": image.id,
            "key": key,
            "path": output.display().to_string(),
            "bytes": bytes.len(),
        }));
    }
    println!("Saved {} bytes to {}", bytes.len(), output.display());
    Ok(())
}
