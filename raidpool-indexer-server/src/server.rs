use crate::{scheduler, Settings};
use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use raidpool_indexer_logic::{
    indexer::{client::RpcReader, CycleStats, Indexer},
    quests::Engine,
};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::{sync::Arc, time::Duration};
use tokio::sync::Mutex;

#[derive(Clone)]
pub(crate) struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub indexer: Arc<Indexer<RpcReader>>,
    pub engine: Arc<Engine>,
    // serializes manual triggers with the scheduled loops
    pub indexer_lock: Arc<Mutex<()>>,
    pub engine_lock: Arc<Mutex<()>>,
    pub reconcile_window: Duration,
}

pub async fn run(settings: Settings, db_connection: DatabaseConnection) -> Result<(), anyhow::Error> {
    let db = Arc::new(db_connection);
    let reader = RpcReader::new(&settings.indexer)?;
    let indexer = Arc::new(Indexer::new(reader, db.clone(), settings.indexer.clone()));
    let engine = Arc::new(Engine::new(db.clone(), settings.quests.clone()));

    let state = AppState {
        db,
        indexer,
        engine,
        indexer_lock: Arc::new(Mutex::new(())),
        engine_lock: Arc::new(Mutex::new(())),
        reconcile_window: settings.quests.reconcile_window,
    };

    scheduler::start(state.clone(), &settings);

    let addr = settings.server.http.addr;
    tracing::info!(?addr, "starting http server");
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .route("/health", web::get().to(health))
            .route(
                "/api/v1/indexer/cycle",
                web::post().to(trigger_indexer_cycle),
            )
            .route("/api/v1/quests/cycle", web::post().to(trigger_quest_cycle))
    })
    .bind(addr)?
    .run()
    .await?;
    Ok(())
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse { status: "ok" })
}

#[derive(Serialize)]
struct IndexerCycleResponse {
    fetched: usize,
    persisted: usize,
    failed: usize,
    backfilled: usize,
    cursor_advanced_to: Option<u64>,
}

impl From<CycleStats> for IndexerCycleResponse {
    fn from(stats: CycleStats) -> Self {
        Self {
            fetched: stats.fetched,
            persisted: stats.persisted,
            failed: stats.failed,
            backfilled: stats.backfilled,
            cursor_advanced_to: stats.cursor_advanced_to,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

async fn trigger_indexer_cycle(state: web::Data<AppState>) -> HttpResponse {
    let Ok(_guard) = state.indexer_lock.try_lock() else {
        return HttpResponse::Conflict().json(ErrorResponse {
            error: "an indexer cycle is already running".to_string(),
        });
    };
    match state.indexer.run_cycle().await {
        Ok(stats) => HttpResponse::Ok().json(IndexerCycleResponse::from(stats)),
        Err(err) => {
            tracing::error!(error = ?err, "manually triggered indexer cycle failed");
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: format!("{err:#}"),
            })
        }
    }
}

#[derive(Serialize)]
struct QuestCycleResponse {
    processed: usize,
    failed: usize,
}

async fn trigger_quest_cycle(state: web::Data<AppState>) -> HttpResponse {
    let Ok(_guard) = state.engine_lock.try_lock() else {
        return HttpResponse::Conflict().json(ErrorResponse {
            error: "a quest engine cycle is already running".to_string(),
        });
    };
    match state.engine.process_pending_events().await {
        Ok(stats) => HttpResponse::Ok().json(QuestCycleResponse {
            processed: stats.processed,
            failed: stats.failed,
        }),
        Err(err) => {
            tracing::error!(error = ?err, "manually triggered quest cycle failed");
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: format!("{err:#}"),
            })
        }
    }
}
