use crate::domain::badge_registry::{BadgeInfo, TrustLevel, TrustLevelInfo};
use crate::domain::commands::trust::{TrustProfile, TrustRecomputeResult, TrustSummary};
use crate::domain::models::badge::TrustBadge;
use crate::io::rest::mappers::rating_mapper::RatingMapper;
use shared::{
    BadgeInfoResponse, TrustBadgeResponse, TrustLevelInfoResponse, TrustProfileResponse,
    TrustScoreUpdateResponse, UserTrustSummary,
};

pub struct TrustMapper;

impl TrustMapper {
    pub fn badge_to_dto(badge: TrustBadge) -> TrustBadgeResponse {
        TrustBadgeResponse {
            id: badge.id,
            badge_type: badge.badge_type,
            earned_date: badge.earned_date,
            is_active: badge.is_active,
        }
    }

    pub fn profile_to_dto(profile: TrustProfile) -> TrustProfileResponse {
        let user = profile.user;
        TrustProfileResponse {
            trust_level: TrustLevel::for_score(user.trust_score).as_str().to_string(),
            user_id: user.id,
            username: user.username,
            average_rating: user.average_rating,
            total_ratings: user.total_ratings,
            total_transactions: user.total_transactions,
            successful_transactions: user.successful_transactions,
            late_returns: user.late_returns,
            trust_score: user.trust_score,
            is_profile_hidden: user.is_profile_hidden,
            badges: profile.badges.into_iter().map(Self::badge_to_dto).collect(),
            recent_ratings: profile
                .recent_ratings
                .into_iter()
                .map(RatingMapper::to_dto)
                .collect(),
        }
    }

    pub fn summary_to_dto(summary: TrustSummary) -> UserTrustSummary {
        let user = summary.user;
        UserTrustSummary {
            trust_level: TrustLevel::for_score(user.trust_score).as_str().to_string(),
            user_id: user.id,
            username: user.username,
            average_rating: user.average_rating,
            total_ratings: user.total_ratings,
            trust_score: user.trust_score,
            badges: summary.active_badges,
        }
    }

    pub fn update_to_dto(result: TrustRecomputeResult) -> TrustScoreUpdateResponse {
        TrustScoreUpdateResponse {
            message: "Trust score updated successfully".to_string(),
            new_trust_score: result.trust_score,
            badges: result
                .badges
                .into_iter()
                .map(|b| b.as_str().to_string())
                .collect(),
        }
    }

    pub fn badge_info_to_dto(info: BadgeInfo) -> BadgeInfoResponse {
        BadgeInfoResponse {
            label: info.label,
            icon: info.icon.to_string(),
            color: info.color.to_string(),
            description: info.description.to_string(),
        }
    }

    pub fn level_info_to_dto(info: TrustLevelInfo) -> TrustLevelInfoResponse {
        TrustLevelInfoResponse {
            level: info.level.as_str().to_string(),
            label: info.label.to_string(),
            color: info.color.to_string(),
            icon: info.icon.to_string(),
            description: info.description.to_string(),
        }
    }
}
