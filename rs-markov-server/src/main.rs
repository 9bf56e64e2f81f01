mod config;

use std::io;
use std::sync::Mutex;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{get, post, put, web, App, HttpResponse, HttpServer, Responder};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use rs_markov_core::io::{corpus_name, list_files};
use rs_markov_core::model::config::ModelConfig;
use rs_markov_core::model::selector::SelectorKind;
use rs_markov_core::model::tokenizer::WordTokenizer;
use rs_markov_core::{MarkovError, StringMarkov};

use crate::config::ServerConfig;

/// Body of `POST /v1/train`
#[derive(Serialize, Deserialize)]
struct TrainRequest {
	training_data: String,
	model_level: Option<usize>,
	selector: Option<SelectorKind>,
}

#[derive(Serialize, Deserialize)]
struct TrainResponse {
	message: String,
	error: Option<String>,
}

/// Body of `POST /v1/predictions`
#[derive(Serialize, Deserialize)]
struct PredictionsRequest {
	seed_text: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct PredictionsResponse {
	suggestions: Vec<String>,
	error: Option<String>,
}

/// Query parameters for the `/v1/generate` endpoint
#[derive(Deserialize)]
struct GenerateParams {
	count: Option<usize>,
	seed: Option<String>,
	unique: Option<bool>,
}

#[derive(Deserialize)]
struct FitParams {
	phrase: String,
}

#[derive(Serialize, Deserialize)]
struct FitResponse {
	probability: f64,
	matches: usize,
	windows: usize,
}

#[derive(Deserialize)]
struct ModelQuery {
	names: Option<String>,
	level: Option<usize>,
}

#[derive(Deserialize)]
struct RetrainQuery {
	level: usize,
}

struct SharedData {
	model: StringMarkov,
	/// Corpora merged into `model` by `/v1/load_models`
	names: Vec<String>,
}

impl SharedData {
	fn new(level: usize) -> Result<Self, MarkovError> {
		Ok(Self {
			model: StringMarkov::new(WordTokenizer, level)?,
			names: Vec::new(),
		})
	}
}

/// Maps an engine error to the matching HTTP status.
fn error_response(e: &MarkovError) -> HttpResponse {
	match e {
		MarkovError::InvalidLevel(_) | MarkovError::InvalidWalkCount(_) | MarkovError::Config(_) => {
			HttpResponse::BadRequest().body(e.to_string())
		}
		_ if e.is_not_found() => HttpResponse::NotFound().body(e.to_string()),
		MarkovError::Io(io_error) if io_error.kind() == io::ErrorKind::NotFound => {
			HttpResponse::NotFound().body(e.to_string())
		}
		_ => HttpResponse::InternalServerError().body(e.to_string()),
	}
}

/// Splits free text into training lines on newlines and sentence punctuation.
fn split_training_data(data: &str) -> Vec<String> {
	data.split(['\n', '.', '!', '?'])
		.map(str::trim)
		.filter(|line| !line.is_empty())
		.map(str::to_owned)
		.collect()
}

/// HTTP POST endpoint `/v1/train`
///
/// Replaces the served model with a new one trained on the request text.
#[post("/v1/train")]
async fn post_train(
	data: web::Data<Mutex<SharedData>>,
	settings: web::Data<ServerConfig>,
	body: web::Json<TrainRequest>,
) -> impl Responder {
	let request = body.into_inner();
	let config = ModelConfig {
		level: request.model_level.unwrap_or(settings.default_level),
		selector: request.selector.unwrap_or_default(),
		..ModelConfig::default()
	};

	let model = match StringMarkov::with_config(WordTokenizer, config) {
		Ok(m) => m,
		Err(e) => {
			return HttpResponse::BadRequest().json(TrainResponse {
				message: String::new(),
				error: Some(e.to_string()),
			})
		}
	};

	let lines = split_training_data(&request.training_data);
	let line_count = lines.len();
	model.learn_all(lines, true);

	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	let message = format!("Learnt {} lines of training data using level {}", line_count, model.level());
	shared_data.model = model;
	shared_data.names.clear();

	HttpResponse::Ok().json(TrainResponse { message, error: None })
}

/// HTTP POST endpoint `/v1/predictions`
///
/// Suggests the next words for a seed, most frequent first.
#[post("/v1/predictions")]
async fn post_predictions(data: web::Data<Mutex<SharedData>>, body: web::Json<PredictionsRequest>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	if shared_data.model.corpus_len() == 0 {
		return HttpResponse::Ok().json(PredictionsResponse {
			suggestions: Vec::new(),
			error: Some("No model has been trained, please train data again".to_owned()),
		});
	}

	let seed = body.seed_text.as_deref().map(str::trim).unwrap_or_default().to_owned();
	match shared_data.model.suggest(&seed) {
		Ok(suggestions) => HttpResponse::Ok().json(PredictionsResponse { suggestions, error: None }),
		Err(e) => HttpResponse::Ok().json(PredictionsResponse {
			suggestions: Vec::new(),
			error: Some(e.to_string()),
		}),
	}
}

/// HTTP GET endpoint `/v1/generate`
///
/// Walks the served model and returns one generated line per row.
#[get("/v1/generate")]
async fn get_generated(data: web::Data<Mutex<SharedData>>, query: web::Query<GenerateParams>) -> impl Responder {
	let count = query.count.unwrap_or(1);
	let seed = query.seed.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_owned);

	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	let unique = query.unique.unwrap_or(shared_data.model.ensure_unique_walk());
	let result = shared_data
		.model
		.walk_with(count, seed.as_ref(), unique)
		.map(|walk| walk.collect::<Vec<String>>());

	match result {
		Ok(lines) => HttpResponse::Ok().body(lines.join("\n")),
		Err(e) => error_response(&e),
	}
}

#[get("/v1/statistics")]
async fn get_statistics(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	HttpResponse::Ok().json(shared_data.model.statistics())
}

#[get("/v1/fit")]
async fn get_fit(data: web::Data<Mutex<SharedData>>, query: web::Query<FitParams>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	let fit = shared_data.model.get_fit(&query.phrase.trim().to_owned());
	HttpResponse::Ok().json(FitResponse {
		probability: fit.probability(),
		matches: fit.matches(),
		windows: fit.raw.len(),
	})
}

#[get("/v1/models")]
async fn get_models(settings: web::Data<ServerConfig>) -> impl Responder {
	match list_files(&settings.data_dir, "dat") {
		Ok(files) => {
			let names: Vec<String> = files.iter().filter_map(|f| corpus_name(f).ok()).collect();
			HttpResponse::Ok().body(names.join("\n"))
		}
		Err(e) => {
			warn!("Failed to list models in {}: {}", settings.data_dir.display(), e);
			HttpResponse::InternalServerError().body("Failed to list models")
		}
	}
}

#[get("/v1/loaded_models")]
async fn get_loaded_models(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	HttpResponse::Ok().body(shared_data.names.join("\n"))
}

/// HTTP PUT endpoint `/v1/load_models`
///
/// Replaces the served model with the merge of the named `.dat` corpora.
#[put("/v1/load_models")]
async fn put_model(
	data: web::Data<Mutex<SharedData>>,
	settings: web::Data<ServerConfig>,
	query: web::Query<ModelQuery>,
) -> impl Responder {
	let query_names = match &query.names {
		Some(s) if !s.trim().is_empty() => s.trim(),
		_ => return HttpResponse::BadRequest().body("Missing or empty model name"),
	};

	let model_names: Vec<&str> = query_names
		.split(',')
		.map(|s| s.trim())
		.filter(|s| !s.is_empty())
		.collect();
	if model_names.iter().any(|name| name.contains(['/', '\\']) || name.contains("..")) {
		return HttpResponse::BadRequest().body("Model names cannot contain paths");
	}

	let level = query.level.unwrap_or(settings.default_level);
	let mut loaded = match SharedData::new(level) {
		Ok(d) => d,
		Err(e) => return error_response(&e),
	};
	for name in model_names {
		let model_path = settings.data_dir.join(format!("{name}.dat"));
		let partial_model = match StringMarkov::from_corpus_file(WordTokenizer, &model_path, level) {
			Ok(m) => m,
			Err(e) => {
				warn!("Failed to load model {}: {}", model_path.display(), e);
				return error_response(&e);
			}
		};
		let added = loaded.model.merge(&partial_model);
		info!("Merged {} new lines from model '{}'", added, name);
		loaded.names.push(name.to_owned());
	}

	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	*shared_data = loaded;
	HttpResponse::Ok().body("Models loaded successfully")
}

#[put("/v1/retrain")]
async fn put_retrain(data: web::Data<Mutex<SharedData>>, query: web::Query<RetrainQuery>) -> impl Responder {
	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	match shared_data.model.retrain(query.level) {
		Ok(()) => HttpResponse::Ok().body(format!("Model retrained at level {}", query.level)),
		Err(e) => error_response(&e),
	}
}

/// Main entry point for the server.
///
/// Starts with an empty model wrapped in a `Mutex`, then serves the
/// training, generation and model loading endpoints.
///
/// # Notes
/// - Bind address, data folder and default level come from `ServerConfig::from_env`.
/// - Logging is configured with `RUST_LOG` (defaults to `info`).
#[actix_web::main]
async fn main() -> io::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let settings = ServerConfig::from_env().map_err(io::Error::other)?;
	let shared_data = SharedData::new(settings.default_level).map_err(io::Error::other)?;
	let shared_model = web::Data::new(Mutex::new(shared_data));

	info!(
		"Serving models from {} on {}:{}",
		settings.data_dir.display(),
		settings.host,
		settings.port
	);
	let bind = (settings.host.clone(), settings.port);
	let settings = web::Data::new(settings);

	HttpServer::new(move || {
		App::new()
			.wrap(Logger::default())
			.wrap(Cors::default().allow_any_origin().allow_any_method().allow_any_header())
			.app_data(shared_model.clone())
			.app_data(settings.clone())
			.service(post_train)
			.service(post_predictions)
			.service(get_generated)
			.service(get_statistics)
			.service(get_fit)
			.service(get_models)
			.service(put_model)
			.service(get_loaded_models)
			.service(put_retrain)
	})
		.bind(bind)?
		.run()
		.await
}
