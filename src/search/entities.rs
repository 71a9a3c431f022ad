//! Per-kind searchers: fetch → match → aggregate / 各类型实体搜索
//!
//! The course listing is fatal on failure. Nested listings run per course
//! with bounded concurrency; a failed course is skipped. Aggregation order
//! follows course listing order, which later breaks relevance ties.

use anyhow::Result;
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, StreamExt};

use super::matcher::QueryMatcher;
use super::types::{
    AnnouncementMeta, AssignmentMeta, CourseMeta, EntityKind, PersonMeta, ResultMetadata, SearchResult,
};
use crate::models::{Course, CourseMember};
use crate::provider::EducationDataProvider;

/// Fetch policy shared by all searchers / 拉取参数
#[derive(Debug, Clone, Copy)]
pub struct FetchOptions {
    pub course_page_size: u32,
    pub course_concurrency: usize,
}

/// Failure of the top-level course listing / 课程列表拉取失败
#[derive(Debug)]
pub struct CourseListingError(pub anyhow::Error);

/// Run the fetch and match stages for one kind / 执行单类型搜索
pub async fn collect_matches(
    provider: &dyn EducationDataProvider,
    kind: EntityKind,
    matcher: &QueryMatcher,
    options: FetchOptions,
) -> Result<Vec<SearchResult>, CourseListingError> {
    let courses = provider
        .list_courses(options.course_page_size)
        .await
        .map_err(CourseListingError)?;
    tracing::debug!("Listed {} courses from {}", courses.len(), provider.name());

    let results = match kind {
        EntityKind::Course => match_courses(&courses, matcher),
        EntityKind::Student => {
            let rosters = per_course(
                fan_out(&courses, |course| provider.list_students(&course.id)),
                options.course_concurrency,
                "students",
            )
            .await;
            match_members(rosters, matcher, |metadata| ResultMetadata::Student { metadata })
        }
        EntityKind::Teacher => {
            let rosters = per_course(
                fan_out(&courses, |course| provider.list_teachers(&course.id)),
                options.course_concurrency,
                "teachers",
            )
            .await;
            match_members(rosters, matcher, |metadata| ResultMetadata::Teacher { metadata })
        }
        EntityKind::Assignment => {
            let works = per_course(
                fan_out(&courses, |course| provider.list_course_work(&course.id)),
                options.course_concurrency,
                "course work",
            )
            .await;
            let mut results = Vec::new();
            for (course, items) in works {
                for work in items {
                    let Some(relevance) = matcher.assignment(&work) else { continue };
                    let metadata = AssignmentMeta {
                        course_id: course.id.clone(),
                        course_name: course.name.clone(),
                        state: work.state.clone(),
                        due_date: work.due_timestamp(),
                        work_type: work.work_type.clone(),
                        max_points: work.max_points,
                        link: work.alternate_link.clone(),
                    };
                    results.push(SearchResult::new(
                        work.id,
                        work.title,
                        work.description.unwrap_or_default(),
                        ResultMetadata::Assignment { metadata },
                        relevance,
                    ));
                }
            }
            results
        }
        EntityKind::Announcement => {
            let notes = per_course(
                fan_out(&courses, |course| provider.list_announcements(&course.id)),
                options.course_concurrency,
                "announcements",
            )
            .await;
            let mut results = Vec::new();
            for (course, items) in notes {
                for note in items {
                    let Some(relevance) = matcher.announcement(&note) else { continue };
                    let metadata = AnnouncementMeta {
                        course_id: course.id.clone(),
                        course_name: course.name.clone(),
                        state: note.state.clone(),
                        creator_id: note.creator_user_id.clone(),
                        created_at: note.creation_time.clone(),
                        link: note.alternate_link.clone(),
                    };
                    results.push(SearchResult::new(
                        note.id,
                        announcement_title(&note.text),
                        note.text,
                        ResultMetadata::Announcement { metadata },
                        relevance,
                    ));
                }
            }
            results
        }
    };

    Ok(results)
}

fn match_courses(courses: &[Course], matcher: &QueryMatcher) -> Vec<SearchResult> {
    courses
        .iter()
        .filter_map(|course| {
            let relevance = matcher.course(course)?;
            let metadata = CourseMeta {
                section: course.section.clone(),
                room: course.room.clone(),
                owner_id: course.owner_id.clone(),
                state: course.course_state.clone(),
                enrollment_code: course.enrollment_code.clone(),
                link: course.alternate_link.clone(),
            };
            Some(SearchResult::new(
                course.id.clone(),
                course.name.clone(),
                course.description.clone().unwrap_or_default(),
                ResultMetadata::Course { metadata },
                relevance,
            ))
        })
        .collect()
}

fn match_members<F>(rosters: Vec<(&Course, Vec<CourseMember>)>, matcher: &QueryMatcher, wrap: F) -> Vec<SearchResult>
where
    F: Fn(PersonMeta) -> ResultMetadata,
{
    let mut results = Vec::new();
    for (course, members) in rosters {
        for member in members {
            let Some(relevance) = matcher.person(&member.profile) else { continue };
            let email = member.profile.email_address.clone();
            let metadata = PersonMeta {
                course_id: course.id.clone(),
                course_name: course.name.clone(),
                email: email.clone(),
                photo_url: member.profile.photo_url.clone(),
            };
            results.push(SearchResult::new(
                member.user_id,
                member.profile.display_name(),
                email,
                wrap(metadata),
                relevance,
            ));
        }
    }
    results
}

/// First line of an announcement, shortened for display / 公告标题
fn announcement_title(text: &str) -> String {
    const MAX_TITLE_CHARS: usize = 80;
    let first_line = text.lines().next().unwrap_or("").trim();
    if first_line.chars().count() <= MAX_TITLE_CHARS {
        first_line.to_string()
    } else {
        let cut: String = first_line.chars().take(MAX_TITLE_CHARS).collect();
        format!("{}…", cut)
    }
}

/// One pending per-course fetch / 单个课程的待执行拉取
type CourseFetch<'a, T> = BoxFuture<'a, (&'a Course, Result<Vec<T>>)>;

/// Build one fetch per course, in listing order / 为每个课程创建拉取任务
///
/// Futures are created eagerly and boxed so the aggregation future stays `Send`.
fn fan_out<'a, T, F>(courses: &'a [Course], fetch: F) -> Vec<CourseFetch<'a, T>>
where
    T: Send + 'a,
    F: Fn(&'a Course) -> BoxFuture<'a, Result<Vec<T>>>,
{
    courses
        .iter()
        .map(|course| fetch(course).map(move |outcome| (course, outcome)).boxed())
        .collect()
}

/// Run per-course fetches, skipping failed courses / 按课程拉取子集合
///
/// `buffered` yields in input order, so the output follows course listing
/// order whatever order the fetches complete in.
async fn per_course<'a, T>(
    fetches: Vec<CourseFetch<'a, T>>,
    concurrency: usize,
    what: &str,
) -> Vec<(&'a Course, Vec<T>)> {
    let outcomes: Vec<(&'a Course, Result<Vec<T>>)> = stream::iter(fetches)
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let mut fetched = Vec::with_capacity(outcomes.len());
    for (course, outcome) in outcomes {
        match outcome {
            Ok(items) => fetched.push((course, items)),
            Err(e) => {
                tracing::warn!("Skipping course {} while listing {}: {}", course.id, what, e);
            }
        }
    }
    fetched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Announcement, CourseWork, Date, Name, UserProfile};
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::time::Duration;

    #[derive(Default)]
    struct FakeProvider {
        courses: Vec<Course>,
        members: HashMap<String, Vec<CourseMember>>,
        works: HashMap<String, Vec<CourseWork>>,
        notes: HashMap<String, Vec<Announcement>>,
        failing: HashSet<String>,
        delays: HashMap<String, Duration>,
        fail_listing: bool,
    }

    impl FakeProvider {
        async fn check(&self, course_id: &str) -> Result<()> {
            if let Some(delay) = self.delays.get(course_id) {
                tokio::time::sleep(*delay).await;
            }
            if self.failing.contains(course_id) {
                return Err(anyhow!("403 forbidden for {}", course_id));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl EducationDataProvider for FakeProvider {
        fn name(&self) -> &str {
            "fake"
        }
        async fn list_courses(&self, _page_size: u32) -> Result<Vec<Course>> {
            if self.fail_listing {
                return Err(anyhow!("503 unavailable"));
            }
            Ok(self.courses.clone())
        }
        async fn list_students(&self, course_id: &str) -> Result<Vec<CourseMember>> {
            self.check(course_id).await?;
            Ok(self.members.get(course_id).cloned().unwrap_or_default())
        }
        async fn list_teachers(&self, course_id: &str) -> Result<Vec<CourseMember>> {
            self.list_students(course_id).await
        }
        async fn list_course_work(&self, course_id: &str) -> Result<Vec<CourseWork>> {
            self.check(course_id).await?;
            Ok(self.works.get(course_id).cloned().unwrap_or_default())
        }
        async fn list_announcements(&self, course_id: &str) -> Result<Vec<Announcement>> {
            self.check(course_id).await?;
            Ok(self.notes.get(course_id).cloned().unwrap_or_default())
        }
    }

    fn course(id: &str, name: &str) -> Course {
        Course { id: id.to_string(), name: name.to_string(), ..Course::default() }
    }

    fn member(course_id: &str, user_id: &str, name: &str) -> CourseMember {
        CourseMember {
            course_id: course_id.to_string(),
            user_id: user_id.to_string(),
            profile: UserProfile {
                id: user_id.to_string(),
                name: Name { full_name: name.to_string(), ..Name::default() },
                email_address: format!("{}@example.com", user_id),
                photo_url: None,
            },
        }
    }

    const OPTIONS: FetchOptions = FetchOptions { course_page_size: 100, course_concurrency: 2 };

    #[tokio::test]
    async fn test_course_matches() {
        let provider = FakeProvider {
            courses: vec![course("c1", "Math 101"), course("c2", "Biology")],
            ..FakeProvider::default()
        };
        let results = collect_matches(&provider, EntityKind::Course, &QueryMatcher::new("math"), OPTIONS)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "c1");
        assert_eq!(results[0].relevance, 1.0);
        assert_eq!(results[0].kind(), EntityKind::Course);
    }

    #[tokio::test]
    async fn test_course_listing_failure_is_fatal() {
        let provider = FakeProvider { fail_listing: true, ..FakeProvider::default() };
        let outcome = collect_matches(&provider, EntityKind::Student, &QueryMatcher::new("a"), OPTIONS).await;
        assert!(outcome.is_err());
    }

    #[tokio::test]
    async fn test_failed_course_is_skipped() {
        let mut provider = FakeProvider {
            courses: vec![course("c1", "Math"), course("c2", "Art"), course("c3", "Music")],
            ..FakeProvider::default()
        };
        for id in ["c1", "c2", "c3"] {
            provider.members.insert(id.to_string(), vec![member(id, &format!("s-{}", id), "Ann")]);
        }
        provider.failing.insert("c2".to_string());

        let results = collect_matches(&provider, EntityKind::Student, &QueryMatcher::new("ann"), OPTIONS)
            .await
            .unwrap();
        let ids: Vec<_> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["s-c1", "s-c3"]);
        assert_eq!(results[1].metadata.course_id(), Some("c3"));
    }

    fn work(course_id: &str, id: &str, title: &str) -> CourseWork {
        CourseWork {
            course_id: course_id.to_string(),
            id: id.to_string(),
            title: title.to_string(),
            ..CourseWork::default()
        }
    }

    #[tokio::test]
    async fn test_order_follows_course_listing_not_completion() {
        let mut provider = FakeProvider {
            courses: vec![course("c1", "Math"), course("c2", "Art"), course("c3", "Music")],
            ..FakeProvider::default()
        };
        for id in ["c1", "c2", "c3"] {
            provider.works.insert(id.to_string(), vec![work(id, &format!("w-{}", id), "Lab report")]);
        }
        provider.delays.insert("c1".to_string(), Duration::from_millis(80));
        provider.delays.insert("c2".to_string(), Duration::from_millis(40));

        let options = FetchOptions { course_page_size: 100, course_concurrency: 3 };
        let results = collect_matches(&provider, EntityKind::Assignment, &QueryMatcher::new("lab"), options)
            .await
            .unwrap();
        let ids: Vec<_> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["w-c1", "w-c2", "w-c3"]);
    }

    #[tokio::test]
    async fn test_failed_course_is_skipped_for_assignments_and_announcements() {
        let mut provider = FakeProvider {
            courses: vec![course("c1", "Math"), course("c2", "Art")],
            ..FakeProvider::default()
        };
        provider.works.insert("c1".to_string(), vec![work("c1", "w1", "Quiz one")]);
        provider.works.insert("c2".to_string(), vec![work("c2", "w2", "Quiz two")]);
        provider.notes.insert(
            "c2".to_string(),
            vec![Announcement { id: "a2".to_string(), text: "Quiz moved".to_string(), ..Announcement::default() }],
        );
        provider.failing.insert("c1".to_string());

        let works = collect_matches(&provider, EntityKind::Assignment, &QueryMatcher::new("quiz"), OPTIONS)
            .await
            .unwrap();
        let ids: Vec<_> = works.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["w2"]);

        let notes = collect_matches(&provider, EntityKind::Announcement, &QueryMatcher::new("quiz"), OPTIONS)
            .await
            .unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].metadata.course_id(), Some("c2"));
    }

    #[tokio::test]
    async fn test_teacher_results_are_tagged_teacher() {
        let mut provider = FakeProvider { courses: vec![course("c1", "Math")], ..FakeProvider::default() };
        provider.members.insert("c1".to_string(), vec![member("c1", "t1", "Grace Hopper")]);
        let results = collect_matches(&provider, EntityKind::Teacher, &QueryMatcher::new("grace"), OPTIONS)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].kind(), EntityKind::Teacher);
        assert_eq!(results[0].description, "t1@example.com");
    }

    #[tokio::test]
    async fn test_assignment_metadata() {
        let mut provider = FakeProvider { courses: vec![course("c1", "Math")], ..FakeProvider::default() };
        provider.works.insert(
            "c1".to_string(),
            vec![
                CourseWork {
                    course_id: "c1".to_string(),
                    id: "w1".to_string(),
                    title: "Essay".to_string(),
                    state: Some("PUBLISHED".to_string()),
                    due_date: Some(Date { year: 2024, month: 5, day: 1 }),
                    ..CourseWork::default()
                },
                CourseWork { id: "w2".to_string(), title: "Quiz".to_string(), ..CourseWork::default() },
            ],
        );
        let results = collect_matches(&provider, EntityKind::Assignment, &QueryMatcher::new("essay"), OPTIONS)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        match &results[0].metadata {
            ResultMetadata::Assignment { metadata } => {
                assert_eq!(metadata.course_name, "Math");
                assert_eq!(metadata.state.as_deref(), Some("PUBLISHED"));
                assert_eq!(metadata.due_date.as_deref(), Some("2024-05-01T00:00:00Z"));
            }
            other => panic!("unexpected metadata {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_announcement_title_from_text() {
        let mut provider = FakeProvider { courses: vec![course("c1", "Math")], ..FakeProvider::default() };
        provider.notes.insert(
            "c1".to_string(),
            vec![Announcement {
                id: "a1".to_string(),
                text: "Exam moved\nSee the updated schedule".to_string(),
                ..Announcement::default()
            }],
        );
        let results = collect_matches(&provider, EntityKind::Announcement, &QueryMatcher::new("schedule"), OPTIONS)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Exam moved");
        assert_eq!(results[0].relevance, 0.5);
    }

    #[test]
    fn test_long_announcement_title_is_shortened() {
        let text = "x".repeat(200);
        let title = announcement_title(&text);
        assert_eq!(title.chars().count(), 81);
        assert!(title.ends_with('…'));
    }
}
