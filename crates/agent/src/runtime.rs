use std::sync::Arc;

use chowbot_core::config::AppConfig;
use chowbot_core::domain::intent::{GuildId, Intent};
use chowbot_core::errors::GatewayError;
use chowbot_core::spin::{detect_spin_source, SpinSource};
use chowbot_db::{JsonStyleRepository, JsonWishlistRepository, StyleRepository, WishlistRepository};
use chowbot_gateway::{
    GoogleMapsClient, NutritionProvider, OpenMeteoClient, PlaceProvider, UsdaClient,
    WeatherProvider,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::chat::ChatHandler;
use crate::clock::{Clock, TaipeiClock};
use crate::llm::{GeneratorError, HttpLlmClient, LlmClient};
use crate::nutrition::{NutritionHandler, RECIPE_USAGE};
use crate::pipeline::{FoodAnswer, FoodQueryPipeline, PipelineSettings};
use crate::router::IntentRouter;
use crate::spin::SpinSelector;
use crate::style::StyleRewriter;
use crate::weather::WeatherHandler;

/// Everything the runtime talks to. `nutrition` is absent without a USDA key.
#[derive(Clone)]
pub struct AgentServices {
    pub llm: Arc<dyn LlmClient>,
    pub places: Arc<dyn PlaceProvider>,
    pub weather: Arc<dyn WeatherProvider>,
    pub nutrition: Option<Arc<dyn NutritionProvider>>,
    pub wishlist: Arc<dyn WishlistRepository>,
    pub styles: Arc<dyn StyleRepository>,
    pub clock: Arc<dyn Clock>,
    pub settings: PipelineSettings,
}

#[derive(Debug, Error)]
pub enum ServicesError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Generator(#[from] GeneratorError),
}

impl AgentServices {
    /// Production wiring. A missing Google key is fatal; a missing USDA key only
    /// disables nutrition and a missing generator key leaves every generator
    /// call short-circuiting.
    pub fn from_config(config: &AppConfig) -> Result<Self, ServicesError> {
        let gateway = &config.gateway;
        let places = GoogleMapsClient::new(gateway.google_api_key(), gateway.timeout_secs)?;
        let weather = OpenMeteoClient::new(gateway.timeout_secs)?;
        let nutrition: Option<Arc<dyn NutritionProvider>> =
            match UsdaClient::new(gateway.usda_api_key(), gateway.nutrition_timeout_secs) {
                Ok(client) => Some(Arc::new(client)),
                Err(error) => {
                    warn!(event_name = "agent.services.nutrition_disabled", error = %error, "nutrition lookups disabled");
                    None
                }
            };
        let llm = HttpLlmClient::from_config(&config.llm)?;
        info!(
            event_name = "agent.services.ready",
            generator_configured = llm.is_configured(),
            nutrition_configured = nutrition.is_some(),
            "agent services wired"
        );

        Ok(Self {
            llm: Arc::new(llm),
            places: Arc::new(places),
            weather: Arc::new(weather),
            nutrition,
            wishlist: Arc::new(JsonWishlistRepository::new(&config.storage.wishlist_path)),
            styles: Arc::new(JsonStyleRepository::new(&config.storage.style_path)),
            clock: Arc::new(TaipeiClock),
            settings: PipelineSettings {
                search_radius_m: gateway.search_radius_m,
                ..PipelineSettings::default()
            },
        })
    }
}

/// What the transport should do with a routed message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AgentReply {
    Text(String),
    Food(FoodAnswer),
    /// The transport animates the spin; an empty pool gets the guidance message.
    Spin { candidates: Vec<String>, source: SpinSource },
}

pub struct AgentRuntime {
    router: IntentRouter,
    pipeline: FoodQueryPipeline,
    weather: WeatherHandler,
    nutrition: NutritionHandler,
    chat: ChatHandler,
    spin: SpinSelector,
    style: StyleRewriter,
    wishlist: Arc<dyn WishlistRepository>,
    styles: Arc<dyn StyleRepository>,
    llm: Arc<dyn LlmClient>,
}

impl AgentRuntime {
    pub fn new(services: AgentServices) -> Self {
        let AgentServices { llm, places, weather, nutrition, wishlist, styles, clock, settings } = services;
        Self {
            router: IntentRouter::new(llm.clone()),
            pipeline: FoodQueryPipeline::new(
                llm.clone(),
                places,
                weather.clone(),
                styles.clone(),
                clock,
                settings,
            ),
            weather: WeatherHandler::new(llm.clone(), weather),
            nutrition: NutritionHandler::new(llm.clone(), nutrition),
            chat: ChatHandler::new(llm.clone()),
            spin: SpinSelector::new(wishlist.clone()),
            style: StyleRewriter::new(llm.clone(), styles.clone()),
            wishlist,
            styles,
            llm,
        }
    }

    pub async fn handle_message(&self, text: &str, guild: Option<GuildId>) -> AgentReply {
        match self.router.route(text).await {
            Intent::Food => AgentReply::Food(self.recommend_food(text, guild).await),
            Intent::Weather => {
                let answer = self.weather.run(text).await;
                AgentReply::Text(self.style.apply(&answer, guild).await)
            }
            Intent::Nutrition => {
                let answer = self.nutrition.run(text).await;
                AgentReply::Text(self.style.apply(&answer, guild).await)
            }
            Intent::Spin => {
                let source = detect_spin_source(text);
                let candidates = self.spin.pick_candidates(guild, Vec::new(), source).await;
                AgentReply::Spin { candidates, source }
            }
            Intent::Chat | Intent::Unknown => {
                let answer = self.chat.run(text).await;
                AgentReply::Text(self.style.apply(&answer, guild).await)
            }
        }
    }

    /// The style hint rides inside the synthesis prompt; the answer is not rewritten again.
    pub async fn recommend_food(&self, text: &str, guild: Option<GuildId>) -> FoodAnswer {
        self.pipeline.run(text, guild).await
    }

    pub async fn nutrition_for(&self, food: &str, guild: Option<GuildId>) -> String {
        let answer = self.nutrition.run_single(food).await;
        self.style.apply(&answer, guild).await
    }

    pub async fn recipe_nutrition(&self, ingredients: &str, guild: Option<GuildId>) -> String {
        match self.nutrition.run_recipe(ingredients).await {
            Some(lookup) => {
                let styled = self.style.apply(&lookup.result, guild).await;
                lookup.render(&styled)
            }
            None => RECIPE_USAGE.to_string(),
        }
    }

    pub async fn spin_candidates(
        &self,
        guild: Option<GuildId>,
        explicit_items: Vec<String>,
        source: SpinSource,
    ) -> Vec<String> {
        self.spin.pick_candidates(guild, explicit_items, source).await
    }

    pub fn wishlist(&self) -> &Arc<dyn WishlistRepository> {
        &self.wishlist
    }

    pub fn styles(&self) -> &Arc<dyn StyleRepository> {
        &self.styles
    }

    pub fn generator_configured(&self) -> bool {
        self.llm.is_configured()
    }
}
